// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the four subcommands, one per session operation:
//
//   suggest → run a gazetteer recognizer, auto-accept results
//   search  → regex search with per-match review
//   drop    → remove an entity by id
//   view    → print the colourised document
//
// clap's derive macros generate --help, error messages for
// missing args, and type conversion.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::session::SearchQuery;
use crate::application::target::AnnotationTarget;
use crate::domain::palette::{Overflow, Palette};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add every entity a gazetteer finds, without review
    Suggest(SuggestArgs),

    /// Search for a phrase and review each match
    Search(SearchArgs),

    /// Remove an entity by id
    Drop(DropArgs),

    /// Print the document with entities colour-coded
    View(ViewArgs),
}

/// Where to read the session from and where to save it
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Annotation file (.json) to continue, or a .txt/.docx document to start from
    #[arg(long)]
    pub input: PathBuf,

    /// Where to save; defaults to the input session, or <stem>.annotations.json
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Answer yes to every prompt (accept matches, overwrite files)
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl From<&TargetArgs> for AnnotationTarget {
    fn from(a: &TargetArgs) -> Self {
        AnnotationTarget::new(&a.input, a.output.clone())
    }
}

#[derive(Args, Debug)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// JSON file mapping labels to phrase lists
    #[arg(long)]
    pub gazetteer: PathBuf,

    /// Match gazetteer phrases regardless of case
    #[arg(long)]
    pub ignore_case: bool,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Phrase to search for (regular expression)
    #[arg(long)]
    pub phrase: String,

    /// Match regardless of case
    #[arg(long)]
    pub ignore_case: bool,

    /// Label every accepted match with this; otherwise asked per match
    #[arg(long)]
    pub label: Option<String>,

    /// Characters of context shown either side of a match
    #[arg(long, default_value_t = SearchQuery::DEFAULT_CONTEXT_LEN)]
    pub context_len: usize,
}

impl From<&SearchArgs> for SearchQuery {
    fn from(a: &SearchArgs) -> Self {
        SearchQuery {
            phrase:      a.phrase.clone(),
            match_case:  !a.ignore_case,
            label:       a.label.clone(),
            context_len: a.context_len,
        }
    }
}

#[derive(Args, Debug)]
pub struct DropArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Id of the entity to remove
    #[arg(long)]
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Annotation file (.json) or document to display
    #[arg(long)]
    pub input: PathBuf,

    /// Only colour these labels (repeatable)
    #[arg(long = "focus")]
    pub focus: Vec<String>,

    /// Reuse colours when there are more than five labels
    #[arg(long)]
    pub cycle_colors: bool,
}

impl From<&ViewArgs> for Palette {
    fn from(a: &ViewArgs) -> Self {
        let overflow = if a.cycle_colors { Overflow::Cycle } else { Overflow::Reject };
        Palette::standard().with_overflow(overflow)
    }
}
