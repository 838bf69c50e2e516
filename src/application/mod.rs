// ============================================================
// Layer 2 - Application Layer
// ============================================================
// Orchestrates the other layers around one annotation pass:
// resolve the target, open the session, run an operation,
// hand results back to the CLI for printing.
//
// Rules for this layer:
//   - No clap types here (the CLI converts its args first)
//   - No direct prompting (that goes through a Reviewer)
//   - Only workflow and the session's own bookkeeping
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The annotation session and its operations
pub mod session;

// Input/output path resolution
pub mod target;
