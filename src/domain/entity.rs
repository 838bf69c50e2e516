// ============================================================
// Layer 3 - Entity Span Domain Type
// ============================================================
// An entity span is a labelled, offset-delimited substring of
// the source document:
//
//   text:   "Alice met Bob in Paris."
//   span:   start_idx=10, end_idx=13  →  "Bob"  (PERSON)
//
// Offsets are half-open and counted in characters, not bytes,
// so a file written here lines up with annotation files made
// by tools that index strings by code point.
//
// The label is optional only while a span is a candidate:
// a search match with no fixed label waits for the reviewer
// to name it before it can be stored.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One labelled span of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Opaque unique identifier (UUID v4, simple hex form)
    pub id: String,

    /// The substring this span denotes
    pub text: String,

    /// First character of the span (inclusive)
    pub start_idx: usize,

    /// One past the last character of the span (exclusive)
    pub end_idx: usize,

    /// Uppercase classification, or None while pending input
    pub label: Option<String>,
}

impl EntitySpan {
    /// Build a span with a freshly generated id.
    pub fn new(
        text:      impl Into<String>,
        start_idx: usize,
        end_idx:   usize,
        label:     Option<String>,
    ) -> Self {
        Self {
            id: new_entity_id(),
            text: text.into(),
            start_idx,
            end_idx,
            label,
        }
    }

    /// Structural equality ignoring `id`.
    ///
    /// Every candidate receives a fresh id, so comparing ids as
    /// well would never find a duplicate.
    pub fn same_annotation(&self, other: &EntitySpan) -> bool {
        self.text == other.text
            && self.start_idx == other.start_idx
            && self.end_idx == other.end_idx
            && self.label == other.label
    }

    /// True when the two half-open ranges share at least one character
    pub fn overlaps(&self, other: &EntitySpan) -> bool {
        self.start_idx < other.end_idx && other.start_idx < self.end_idx
    }
}

/// A candidate produced by a recognizer: offsets and a label,
/// without an id or captured text yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedEntity {
    pub start_idx: usize,
    pub end_idx:   usize,
    pub label:     String,
}

impl RecognizedEntity {
    pub fn new(start_idx: usize, end_idx: usize, label: impl Into<String>) -> Self {
        Self { start_idx, end_idx, label: label.into() }
    }
}

/// Fresh collision-free id for a new span
pub fn new_entity_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Trim and uppercase a label. Returns None for blank input.
pub fn normalize_label(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}
