// ============================================================
// Layer 4 - Document Loader
// ============================================================
// Reads the document to annotate from a single file.
//
//   .docx  → parsed with docx-rs, paragraph text joined by '\n'
//   other  → read as UTF-8 text, byte for byte
//
// How .docx files work:
//   A .docx file is a ZIP archive of XML parts. docx-rs gives a
//   typed tree over it:
//     Document
//       └── children: Vec<DocumentChild>
//             └── Paragraph
//                   └── children: Vec<ParagraphChild>
//                         └── Run
//                               └── children: Vec<RunChild>
//                                     └── Text (the actual words!)
//
// The loaded text is NOT cleaned or normalised afterwards.
// Entity offsets index into exactly what this returns.
//
// Reference: docx-rs crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use docx_rs::read_docx;

use crate::domain::document::Document;
use crate::domain::traits::DocumentSource;

/// A document stored in one file on disk.
/// Implements the DocumentSource trait from Layer 3.
pub struct FileDocument {
    path: PathBuf,
}

impl FileDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_docx(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("docx"))
    }
}

impl DocumentSource for FileDocument {
    fn load(&self) -> Result<Document> {
        let doc = if self.is_docx() {
            load_single_docx(&self.path)?
        } else {
            let text = fs::read_to_string(&self.path)
                .with_context(|| format!("Cannot read '{}'", self.path.display()))?;
            Document::new(source_name(&self.path), text)
        };

        tracing::info!(
            "Loaded '{}' ({} chars)",
            doc.source,
            doc.char_len()
        );
        Ok(doc)
    }
}

/// Use the filename as the source identifier
fn source_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Parse a single .docx file and return a Document.
fn load_single_docx(path: &Path) -> Result<Document> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    let docx = read_docx(&bytes)
        .map_err(|e| {
            anyhow::anyhow!("docx-rs parse error in '{}': {:?}", path.display(), e)
        })?;

    let mut paragraphs: Vec<String> = Vec::new();

    for child in &docx.document.children {
        use docx_rs::DocumentChild;

        // Only Paragraph nodes carry running text (not tables, images, etc.)
        if let DocumentChild::Paragraph(para) = child {
            let para_text = extract_paragraph_text(para);

            // Skip empty paragraphs (section breaks, blank lines)
            if !para_text.trim().is_empty() {
                paragraphs.push(para_text);
            }
        }
    }

    Ok(Document::new(source_name(path), paragraphs.join("\n")))
}

/// Concatenate every text run of a paragraph, no separator:
/// runs are pieces of the same sentence split by formatting.
fn extract_paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut parts = Vec::new();

    for child in &para.children {
        use docx_rs::ParagraphChild;

        if let ParagraphChild::Run(run) = child {
            for rc in &run.children {
                use docx_rs::RunChild;

                if let RunChild::Text(t) = rc {
                    parts.push(t.text.clone());
                }
            }
        }
    }

    parts.join("")
}
