// ============================================================
// Layer 3 - Colour Palette
// ============================================================
// Maps entity labels to ANSI colours for the annotated view.
//
// Assignment is deterministic: labels get colours in the order
// they are first seen. With five colours, a sixth label either
// fails with TooManyLabels (Overflow::Reject) or wraps around to
// the first colour again (Overflow::Cycle).
//
// The escape codes are written out literally instead of going
// through a terminal-detection layer, so the same session always
// renders to the same bytes.

use crate::domain::error::AnnotationError;

/// Resets every colour attribute
pub const RESET: &str = "\x1b[0m";

/// Bright red, used to highlight search matches
pub const HIGHLIGHT: &str = "\x1b[91m";

/// The five label colours, in assignment order
pub const STANDARD_COLORS: [&str; 5] = [
    "\x1b[91m", // bright red
    "\x1b[96m", // bright cyan
    "\x1b[36m", // cyan
    "\x1b[94m", // bright blue
    "\x1b[92m", // bright green
];

/// What to do when there are more labels than colours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Reject,
    Cycle,
}

#[derive(Debug, Clone)]
pub struct Palette {
    colors:   Vec<&'static str>,
    overflow: Overflow,
}

impl Default for Palette {
    fn default() -> Self {
        Self::standard()
    }
}

impl Palette {
    /// The five standard colours, rejecting a sixth label
    pub fn standard() -> Self {
        Self {
            colors:   STANDARD_COLORS.to_vec(),
            overflow: Overflow::Reject,
        }
    }

    pub fn with_overflow(mut self, overflow: Overflow) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn capacity(&self) -> usize {
        self.colors.len()
    }

    /// Assign colours to labels in first-seen order. Repeated
    /// labels keep the colour of their first occurrence.
    pub fn assign<'a, I>(&self, labels: I) -> Result<ColorMap, AnnotationError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut distinct: Vec<&str> = Vec::new();
        for label in labels {
            if !distinct.contains(&label) {
                distinct.push(label);
            }
        }

        if self.overflow == Overflow::Reject && distinct.len() > self.capacity() {
            return Err(AnnotationError::TooManyLabels {
                found:    distinct.len(),
                capacity: self.capacity(),
            });
        }

        let entries = distinct
            .into_iter()
            .enumerate()
            .map(|(i, label)| (label.to_string(), self.colors[i % self.colors.len()]))
            .collect();

        Ok(ColorMap { entries })
    }
}

/// The result of a palette assignment, in legend order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorMap {
    entries: Vec<(String, &'static str)>,
}

impl ColorMap {
    pub fn color_of(&self, label: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
    }

    pub fn entries(&self) -> &[(String, &'static str)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Wrap `text` in a colour and a reset
pub fn paint(color: &str, text: &str) -> String {
    format!("{color}{text}{RESET}")
}
