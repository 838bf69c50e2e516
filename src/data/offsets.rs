// ============================================================
// Layer 4 - Character Offsets
// ============================================================
// Rust strings are indexed by byte, but entity offsets are
// counted in characters. CharOffsets keeps the byte position
// of every character boundary so the two can be converted
// both ways without rescanning the text:
//
//   text:        "café au lait"
//   char index:   0 1 2 3 4 ...
//   byte index:   0 1 2 3 5 ...   ('é' is two bytes)
//
// boundaries[i] is the byte where character i starts, and the
// last entry is text.len() so that an exclusive end offset
// equal to the character length is valid.
//
// Reference: Rust Book §8.2 (Storing UTF-8 Encoded Text with Strings)

pub struct CharOffsets<'a> {
    text:       &'a str,
    boundaries: Vec<usize>,
}

impl<'a> CharOffsets<'a> {
    pub fn new(text: &'a str) -> Self {
        let boundaries = text
            .char_indices()
            .map(|(byte, _)| byte)
            .chain(std::iter::once(text.len()))
            .collect();
        Self { text, boundaries }
    }

    /// Number of characters in the text
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Byte position of a character offset, if it is in range
    pub fn to_byte(&self, char_idx: usize) -> Option<usize> {
        self.boundaries.get(char_idx).copied()
    }

    /// Character offset of a byte position, if it sits on a boundary
    pub fn to_char(&self, byte_idx: usize) -> Option<usize> {
        self.boundaries.binary_search(&byte_idx).ok()
    }

    /// Slice the text by a half-open character range
    pub fn slice(&self, start: usize, end: usize) -> Option<&'a str> {
        if start > end {
            return None;
        }
        let from = self.to_byte(start)?;
        let to   = self.to_byte(end)?;
        Some(&self.text[from..to])
    }

    /// Clip a character offset to the text length
    pub fn clamp(&self, char_idx: usize) -> usize {
        char_idx.min(self.char_len())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_offsets_match_bytes() {
        let o = CharOffsets::new("Alice met Bob");
        assert_eq!(o.char_len(), 13);
        assert_eq!(o.to_byte(10), Some(10));
        assert_eq!(o.slice(10, 13), Some("Bob"));
    }

    #[test]
    fn test_multibyte_characters() {
        let o = CharOffsets::new("café au lait");
        assert_eq!(o.char_len(), 12);
        // 'é' is character 3 but takes bytes 3..5
        assert_eq!(o.to_byte(4), Some(5));
        assert_eq!(o.to_char(5), Some(4));
        // Byte 4 is inside 'é'
        assert_eq!(o.to_char(4), None);
        assert_eq!(o.slice(0, 4), Some("café"));
    }

    #[test]
    fn test_end_offset_equal_to_length_is_valid() {
        let o = CharOffsets::new("Paris");
        assert_eq!(o.slice(0, 5), Some("Paris"));
        assert_eq!(o.slice(0, 6), None);
    }

    #[test]
    fn test_reversed_range_is_none() {
        let o = CharOffsets::new("Paris");
        assert_eq!(o.slice(3, 1), None);
    }

    #[test]
    fn test_empty_text() {
        let o = CharOffsets::new("");
        assert_eq!(o.char_len(), 0);
        assert_eq!(o.slice(0, 0), Some(""));
        assert_eq!(o.clamp(30), 0);
    }
}
