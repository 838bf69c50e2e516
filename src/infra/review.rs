// ============================================================
// Layer 6 - Reviewers
// ============================================================
// Implementations of the Reviewer trait: who answers the
// session's questions.
//
//   ConsoleReviewer   → a human at the terminal (dialoguer)
//   HeadlessReviewer  → a fixed policy, for scripts and CI
//
// Reference: dialoguer crate documentation

use anyhow::{bail, Result};
use console::Style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use std::path::Path;

use crate::domain::entity::EntitySpan;
use crate::domain::traits::{MatchPreview, Reviewer};

// ─── ConsoleReviewer ──────────────────────────────────────────────────────────
pub struct ConsoleReviewer {
    theme: ColorfulTheme,
}

impl ConsoleReviewer {
    pub fn new() -> Self {
        Self { theme: ColorfulTheme::default() }
    }
}

impl Default for ConsoleReviewer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reviewer for ConsoleReviewer {
    fn confirm_match(&mut self, preview: &MatchPreview) -> Result<bool> {
        let dim = Style::new().dim();

        println!();
        println!(
            "{}",
            dim.apply_to(format!(
                "Match {} of {} (characters {}..{})",
                preview.position, preview.total, preview.start_idx, preview.end_idx
            ))
        );
        println!("{}", preview.highlighted());

        let accepted = Confirm::with_theme(&self.theme)
            .with_prompt("Do you want to add this to your entity list?")
            .default(false)
            .interact()?;

        if !accepted {
            println!("{}", dim.apply_to("Okay, on to the next one..."));
        }
        Ok(accepted)
    }

    fn request_label(&mut self, candidate: &EntitySpan) -> Result<String> {
        let label: String = Input::with_theme(&self.theme)
            .with_prompt(format!("What should the label be for '{}'?", candidate.text))
            .allow_empty(true)
            .interact_text()?;
        Ok(label)
    }

    fn confirm_overwrite(&mut self, path: &Path) -> Result<bool> {
        let overwrite = Confirm::with_theme(&self.theme)
            .with_prompt(format!(
                "'{}' already exists. Would you like to overwrite it?",
                path.display()
            ))
            .default(false)
            .interact()?;
        Ok(overwrite)
    }
}

// ─── HeadlessReviewer ─────────────────────────────────────────────────────────
/// Answers every question the same way, without a terminal.
#[derive(Debug, Clone, Default)]
pub struct HeadlessReviewer {
    /// Accept every search match
    pub accept_matches: bool,
    /// Overwrite existing files on save
    pub overwrite: bool,
    /// Label for matches that have none; without it labelling fails
    pub default_label: Option<String>,
}

impl HeadlessReviewer {
    /// Accept everything and overwrite
    pub fn accept_all() -> Self {
        Self {
            accept_matches: true,
            overwrite:      true,
            default_label:  None,
        }
    }

    pub fn with_default_label(mut self, label: impl Into<String>) -> Self {
        self.default_label = Some(label.into());
        self
    }
}

impl Reviewer for HeadlessReviewer {
    fn confirm_match(&mut self, preview: &MatchPreview) -> Result<bool> {
        tracing::debug!(
            "Headless review of match {}/{}: {}",
            preview.position,
            preview.total,
            if self.accept_matches { "accept" } else { "decline" }
        );
        Ok(self.accept_matches)
    }

    fn request_label(&mut self, candidate: &EntitySpan) -> Result<String> {
        match &self.default_label {
            Some(label) if !label.trim().is_empty() => Ok(label.clone()),
            _ => bail!(
                "'{}' needs a label but none can be asked for in headless mode (use --label)",
                candidate.text
            ),
        }
    }

    fn confirm_overwrite(&mut self, path: &Path) -> Result<bool> {
        if !self.overwrite {
            tracing::warn!("Not overwriting '{}' in headless mode", path.display());
        }
        Ok(self.overwrite)
    }
}
