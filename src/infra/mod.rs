// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Concrete implementations of the domain's seams:
//
//   session_store.rs  : JSON annotation file read/write.
//                       Answers "does it exist?" and writes;
//                       the overwrite decision is made upstream.
//
//   gazetteer.rs      : Dictionary-based Recognizer. Labels a
//                       document from known phrase lists.
//
//   review.rs         : Reviewers: dialoguer prompts for a
//                       human, or a fixed headless policy.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Annotation file persistence
pub mod session_store;

/// Phrase-dictionary recognizer
pub mod gazetteer;

/// Console and headless reviewers
pub mod review;
