// ============================================================
// Layer 4 - Data Layer
// ============================================================
// Everything that touches the raw text of the document:
//
//   file on disk
//       │
//       ▼
//   FileDocument     → reads .txt / .docx into a Document
//       │
//       ▼
//   CharOffsets      → converts byte positions to char offsets
//       │
//       ▼
//   PhraseMatcher    → finds search matches + builds previews
//
// Reference: Rust Book §8 (Collections), §13 (Iterators)

/// Loads the document text from .txt or .docx files
pub mod loader;

/// Byte <-> character offset mapping
pub mod offsets;

/// Regex phrase search with character offsets
pub mod matcher;
