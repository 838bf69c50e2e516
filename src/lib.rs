//! Interactive named-entity annotation for a single document.
//!
//! An [`AnnotationSession`] holds a document's text and the entity
//! spans tagged in it. Spans come from a [`Recognizer`] (accepted as
//! is) or from a phrase search where a [`Reviewer`] approves each
//! match. Sessions render to ANSI-coloured text and save to JSON.

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;

pub use application::session::{
    AddOutcome, AnnotationSession, RenderedDocument, SaveOutcome, SearchQuery, SearchReport,
};
pub use domain::entity::{EntitySpan, RecognizedEntity};
pub use domain::error::AnnotationError;
pub use domain::palette::{Overflow, Palette};
pub use domain::traits::{DocumentSource, MatchPreview, Recognizer, Reviewer};
