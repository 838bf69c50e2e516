// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, builds the session and a Reviewer, runs one operation,
// prints the outcome and saves.
//
// All span bookkeeping is delegated to Layer 2 (application);
// this layer only routes and prints.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use console::Style;
use commands::{Commands, DropArgs, SearchArgs, SuggestArgs, TargetArgs, ViewArgs};

use crate::application::session::{AnnotationSession, SaveOutcome, SearchQuery};
use crate::application::target::AnnotationTarget;
use crate::domain::palette::Palette;
use crate::domain::traits::Reviewer;
use crate::infra::gazetteer::Gazetteer;
use crate::infra::review::{ConsoleReviewer, HeadlessReviewer};

#[derive(Parser, Debug)]
#[command(
    name = "entity-annotator",
    version,
    about = "Tag named entities in a document, from suggestions or reviewed searches."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Suggest(args) => run_suggest(args),
            Commands::Search(args)  => run_search(args),
            Commands::Drop(args)    => run_drop(args),
            Commands::View(args)    => run_view(args),
        }
    }
}

/// Console prompts unless --yes was given
fn reviewer_for(args: &TargetArgs, label: Option<String>) -> Box<dyn Reviewer> {
    if args.yes {
        let mut headless = HeadlessReviewer::accept_all();
        headless.default_label = label;
        Box::new(headless)
    } else {
        Box::new(ConsoleReviewer::new())
    }
}

fn run_suggest(args: SuggestArgs) -> Result<()> {
    let target       = AnnotationTarget::from(&args.target);
    let mut session  = target.open()?;
    let mut reviewer = reviewer_for(&args.target, None);

    let gazetteer = Gazetteer::from_path(&args.gazetteer, !args.ignore_case)?;
    let added     = session.suggest_entities(&gazetteer)?;

    let dim = Style::new().dim();
    for span in &added {
        println!(
            "{} {} {}",
            dim.apply_to(&span.id),
            span.text,
            span.label.as_deref().unwrap_or("-")
        );
    }
    println!("{} suggested entities added", added.len());

    save(&session, &target, reviewer.as_mut())
}

fn run_search(args: SearchArgs) -> Result<()> {
    let target       = AnnotationTarget::from(&args.target);
    let mut session  = target.open()?;
    let mut reviewer = reviewer_for(&args.target, args.label.clone());
    let query        = SearchQuery::from(&args);

    let report = session.search_and_confirm(&query, reviewer.as_mut())?;

    if report.matches == 0 {
        println!(
            "{}",
            Style::new().yellow().apply_to(
                "There were no matches for the text provided. Check spelling or try --ignore-case."
            )
        );
        return Ok(());
    }

    let green = Style::new().green();
    for span in &report.added {
        println!(
            "{} {} {} {}",
            green.apply_to("ENTITY ADDED!"),
            span.id,
            span.text,
            span.label.as_deref().unwrap_or("-")
        );
    }
    if report.duplicates > 0 {
        println!(
            "{}",
            Style::new().yellow().apply_to(format!("{} already existed", report.duplicates))
        );
    }
    println!(
        "{} matches: {} added, {} declined",
        report.matches,
        report.added.len(),
        report.declined
    );

    if report.added.is_empty() {
        return Ok(());
    }
    save(&session, &target, reviewer.as_mut())
}

fn run_drop(args: DropArgs) -> Result<()> {
    let target       = AnnotationTarget::from(&args.target);
    let mut session  = target.open()?;
    let mut reviewer = reviewer_for(&args.target, None);

    match session.drop_entity(&args.id) {
        Some(removed) => {
            println!("The following entity was removed:");
            println!(
                "{} {} {}..{} {}",
                removed.id,
                removed.text,
                removed.start_idx,
                removed.end_idx,
                removed.label.as_deref().unwrap_or("-")
            );
            save(&session, &target, reviewer.as_mut())
        }
        None => {
            println!(
                "{}",
                Style::new().yellow().apply_to(format!("No entity with id '{}'", args.id))
            );
            Ok(())
        }
    }
}

fn run_view(args: ViewArgs) -> Result<()> {
    let session = AnnotationTarget::new(&args.input, None).open()?;
    let palette = Palette::from(&args);

    let focus    = (!args.focus.is_empty()).then_some(args.focus.as_slice());
    let rendered = session.render(focus, &palette)?;

    println!("{rendered}");
    Ok(())
}

fn save(
    session:  &AnnotationSession,
    target:   &AnnotationTarget,
    reviewer: &mut dyn Reviewer,
) -> Result<()> {
    match session.save(&target.output, reviewer)? {
        SaveOutcome::Written => println!("Saved to {}", target.output.display()),
        SaveOutcome::Skipped => println!("Not saved"),
    }
    Ok(())
}
