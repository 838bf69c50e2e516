// ============================================================
// Layer 4 - Phrase Matcher
// ============================================================
// Finds every occurrence of a search phrase in the document.
//
// The phrase is a regular expression. Case-insensitive search
// sets the regex engine's case-insensitive flag and runs over
// the untouched text, so the reported offsets always point at
// the original characters. (Lowercasing both sides instead can
// change string lengths, e.g. 'İ' lowercases to two chars.)
//
// Matches come back in source order with character offsets.
// Empty matches (a pattern like "x*") are dropped: an entity
// span must cover at least one character.
//
// Reference: regex crate documentation (RegexBuilder)

use regex::{Regex, RegexBuilder};

use crate::data::offsets::CharOffsets;
use crate::domain::error::AnnotationError;
use crate::domain::traits::MatchPreview;

/// One occurrence of the phrase, in character offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatch {
    pub start_idx: usize,
    pub end_idx:   usize,
    pub text:      String,
}

pub struct PhraseMatcher {
    regex: Regex,
}

impl PhraseMatcher {
    /// Compile a phrase. Fails on an empty phrase or an invalid pattern.
    pub fn new(phrase: &str, match_case: bool) -> Result<Self, AnnotationError> {
        if phrase.is_empty() {
            return Err(AnnotationError::EmptyPhrase);
        }

        let regex = RegexBuilder::new(phrase)
            .case_insensitive(!match_case)
            .build()
            .map_err(|e| AnnotationError::InvalidPattern {
                pattern: phrase.to_string(),
                reason:  e.to_string(),
            })?;

        Ok(Self { regex })
    }

    /// All non-empty matches in source order
    pub fn find_all(&self, text: &str) -> Vec<PhraseMatch> {
        let offsets = CharOffsets::new(text);

        self.regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .filter_map(|m| {
                Some(PhraseMatch {
                    start_idx: offsets.to_char(m.start())?,
                    end_idx:   offsets.to_char(m.end())?,
                    text:      m.as_str().to_string(),
                })
            })
            .collect()
    }
}

/// Build the preview shown to the reviewer: up to `context_len`
/// characters either side of the match, clipped at the edges.
pub fn preview(
    text:        &str,
    m:           &PhraseMatch,
    context_len: usize,
    position:    usize,
    total:       usize,
) -> MatchPreview {
    let offsets = CharOffsets::new(text);

    let from = m.start_idx.saturating_sub(context_len);
    let to   = offsets.clamp(m.end_idx.saturating_add(context_len));

    MatchPreview {
        position,
        total,
        before:    offsets.slice(from, m.start_idx).unwrap_or_default().to_string(),
        matched:   m.text.clone(),
        after:     offsets.slice(m.end_idx, to).unwrap_or_default().to_string(),
        start_idx: m.start_idx,
        end_idx:   m.end_idx,
    }
}
