// ============================================================
// Layer 6 - Gazetteer Recognizer
// ============================================================
// A dictionary-based Recognizer: a list of known phrases per
// label, stored as JSON:
//
//   {
//     "PERSON": ["Alice", "Bob"],
//     "GPE":    ["Paris", "New York"]
//   }
//
// All phrases are compiled into one alternation, longest first,
// wrapped in half word boundaries. The regex engine then gives
// leftmost matches, longest phrase at each position, without
// overlaps, in source order. "New York" wins over "York".
//
// This stands in for a statistical NER model. Anything else
// that implements Recognizer plugs into the session the same way.
//
// Reference: Rust Book §8.3 (Hash Maps)
//            regex crate documentation (word boundaries)

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use crate::data::offsets::CharOffsets;
use crate::domain::entity::RecognizedEntity;
use crate::domain::traits::Recognizer;

pub struct Gazetteer {
    /// None when the dictionary has no phrases at all
    regex: Option<Regex>,
    /// Phrase (lowercased unless matching case) → label
    labels: HashMap<String, String>,
    match_case: bool,
}

impl Gazetteer {
    /// Build from label → phrases. When a phrase is listed under
    /// several labels, the first label in sorted order keeps it.
    pub fn from_entries(entries: BTreeMap<String, Vec<String>>, match_case: bool) -> Result<Self> {
        let mut labels: HashMap<String, String> = HashMap::new();
        let mut phrases: Vec<String> = Vec::new();

        for (label, list) in entries {
            for phrase in list {
                let phrase = phrase.trim().to_string();
                if phrase.is_empty() {
                    continue;
                }
                let key = lookup_key(&phrase, match_case);
                if !labels.contains_key(&key) {
                    labels.insert(key, label.clone());
                    phrases.push(phrase);
                }
            }
        }

        // Longest first so the alternation prefers "New York" over "New"
        phrases.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

        let regex = if phrases.is_empty() {
            None
        } else {
            let alternation = phrases
                .iter()
                .map(|p| regex::escape(p))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"\b{{start-half}}(?:{alternation})\b{{end-half}}");
            Some(
                RegexBuilder::new(&pattern)
                    .case_insensitive(!match_case)
                    .build()
                    .context("Cannot compile gazetteer phrases")?,
            )
        };

        tracing::debug!("Gazetteer built with {} phrases", phrases.len());
        Ok(Self { regex, labels, match_case })
    }

    /// Load a JSON gazetteer file
    pub fn from_path(path: &Path, match_case: bool) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read gazetteer '{}'", path.display()))?;

        let entries: BTreeMap<String, Vec<String>> = serde_json::from_str(&json)
            .with_context(|| {
                format!(
                    "'{}' must map labels to lists of phrases",
                    path.display()
                )
            })?;

        Self::from_entries(entries, match_case)
    }

    /// Number of distinct phrases known
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn lookup_key(phrase: &str, match_case: bool) -> String {
    if match_case {
        phrase.to_string()
    } else {
        phrase.to_lowercase()
    }
}

impl Recognizer for Gazetteer {
    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>> {
        let Some(regex) = &self.regex else {
            return Ok(Vec::new());
        };

        let offsets = CharOffsets::new(text);
        let mut found = Vec::new();

        for m in regex.find_iter(text) {
            let key = lookup_key(m.as_str(), self.match_case);
            let (Some(label), Some(start), Some(end)) = (
                self.labels.get(&key),
                offsets.to_char(m.start()),
                offsets.to_char(m.end()),
            ) else {
                // Case folding can match text whose lowercase form
                // differs from every stored key; nothing to label it with.
                tracing::debug!("No gazetteer label for '{}'", m.as_str());
                continue;
            };
            found.push(RecognizedEntity::new(start, end, label.clone()));
        }

        Ok(found)
    }
}
