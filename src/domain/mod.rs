// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define what the
// annotator works with: documents, entity spans, the colour
// palette, and the seams to the outside world (recognizer,
// reviewer, document source).
//
// Rules for this layer:
//   - NO file I/O or terminal access
//   - NO regex or JSON code
//   - Only data types, pure logic, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A loaded document: source name plus its exact text
pub mod document;

// The entity span, the only annotated thing
pub mod entity;

// Typed domain errors
pub mod error;

// Label -> colour assignment for rendering
pub mod palette;

// Core abstractions (traits) that other layers implement
pub mod traits;
