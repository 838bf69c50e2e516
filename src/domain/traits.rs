// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The session never talks to a model, a terminal or a file
// format directly. It goes through these traits instead:
//
//   Recognizer      → proposes entity spans for a text
//   Reviewer        → the human in the loop (accept / label / overwrite)
//   DocumentSource  → where the source text comes from
//
// Swapping the console for a scripted reviewer is what makes
// the interactive flows testable without a terminal.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::path::Path;

use anyhow::Result;

use crate::domain::document::Document;
use crate::domain::entity::{EntitySpan, RecognizedEntity};
use crate::domain::palette::{paint, HIGHLIGHT};

// ─── Recognizer ───────────────────────────────────────────────────────────────
/// Anything that can scan a text and propose labelled spans.
///
/// Offsets in the returned entities are character offsets into
/// `text`, half-open.
///
/// Implementations:
///   - Gazetteer → dictionary of phrases per label
///   - (external) any statistical NER model behind this trait
pub trait Recognizer {
    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>>;
}

// ─── Reviewer ─────────────────────────────────────────────────────────────────
/// What a search match looks like when shown to the reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPreview {
    /// 1-based position of this match among all matches
    pub position: usize,
    /// Total number of matches in the document
    pub total:    usize,
    /// Context text before the match
    pub before:   String,
    /// The matched text itself
    pub matched:  String,
    /// Context text after the match
    pub after:    String,
    /// Character offsets of the match
    pub start_idx: usize,
    pub end_idx:   usize,
}

impl MatchPreview {
    /// Context with the match painted bright red
    pub fn highlighted(&self) -> String {
        format!("{}{}{}", self.before, paint(HIGHLIGHT, &self.matched), self.after)
    }
}

/// The human-in-the-loop decisions a session needs.
///
/// Implementations:
///   - ConsoleReviewer  → dialoguer prompts on the terminal
///   - HeadlessReviewer → fixed answers for scripted runs
pub trait Reviewer {
    /// Should this search match become an entity?
    fn confirm_match(&mut self, preview: &MatchPreview) -> Result<bool>;

    /// Ask for a label for a candidate that has none.
    /// May return blank text; the caller asks again.
    fn request_label(&mut self, candidate: &EntitySpan) -> Result<String>;

    /// The save target already exists: overwrite it?
    fn confirm_overwrite(&mut self, path: &Path) -> Result<bool>;
}

// ─── DocumentSource ───────────────────────────────────────────────────────────
/// Any component that can produce the document to annotate.
///
/// Implementations:
///   - FileDocument → .txt or .docx file on disk
pub trait DocumentSource {
    fn load(&self) -> Result<Document>;
}
