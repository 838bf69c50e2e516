// ============================================================
// Layer 2 - Annotation Target
// ============================================================
// Resolves which session a command works on and where the
// result goes:
//
//   input is a .json annotation file → load it, save back to it
//   input is a document (.txt/.docx) → start a fresh session,
//                                      save to <stem>.annotations.json
//
// An explicit output path always wins.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::application::session::AnnotationSession;
use crate::data::loader::FileDocument;
use crate::domain::traits::DocumentSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationTarget {
    pub input:  PathBuf,
    pub output: PathBuf,
}

impl AnnotationTarget {
    pub fn new(input: impl Into<PathBuf>, output: Option<PathBuf>) -> Self {
        let input  = input.into();
        let output = output.unwrap_or_else(|| default_output(&input));
        Self { input, output }
    }

    /// Load the session named by the input path
    pub fn open(&self) -> Result<AnnotationSession> {
        if is_session_file(&self.input) {
            AnnotationSession::load(&self.input)
        } else {
            let doc = FileDocument::new(&self.input).load()?;
            Ok(AnnotationSession::from_document(doc))
        }
    }
}

fn is_session_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn default_output(input: &Path) -> PathBuf {
    if is_session_file(input) {
        input.to_path_buf()
    } else {
        input.with_extension("annotations.json")
    }
}
