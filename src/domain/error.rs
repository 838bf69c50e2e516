// ============================================================
// Layer 3 - Domain Errors
// ============================================================
// Failures the session reports to its caller as typed values.
// Everything else (file I/O, prompts, recognizer crashes) flows
// through anyhow with context attached at the call site.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("search phrase cannot be empty")]
    EmptyPhrase,

    #[error("invalid search pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("span {start}..{end} is outside a text of {len} characters")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },

    #[error("entity '{id}' says '{stored}' but the text at {start}..{end} is '{actual}'")]
    InconsistentSpan {
        id:     String,
        start:  usize,
        end:    usize,
        stored: String,
        actual: String,
    },

    #[error("entity '{id}' has label '{label}', expected non-blank uppercase")]
    UnnormalisedLabel { id: String, label: String },

    #[error("entity id '{0}' is used more than once")]
    DuplicateId(String),

    #[error("too many label categories: {found} distinct labels but only {capacity} colours")]
    TooManyLabels { found: usize, capacity: usize },
}
