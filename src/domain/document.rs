// ============================================================
// Layer 3 - Document Domain Type
// ============================================================
// Represents a single document loaded from disk.
// Plain data: a source name and the text content exactly as
// extracted. The text is never cleaned after loading, because
// every entity offset refers to it character for character.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// A raw document loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// The filename or path, kept for traceability
    pub source: String,

    /// The full text content of the document
    pub text: String,
}

impl Document {
    /// Create a new Document with a source path and text content.
    ///
    /// Example:
    ///   let doc = Document::new("memo.txt", "Alice met Bob in Paris.");
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text:   text.into(),
        }
    }

    /// Length of the text in characters (not bytes)
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
