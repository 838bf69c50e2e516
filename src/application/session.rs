// ============================================================
// Layer 2 - Annotation Session
// ============================================================
// One document's text paired with its current list of entity
// spans. Every way of changing the list goes through here:
//
//   suggest_entities   → recognizer proposals, auto-accepted
//   search_and_confirm → regex matches, each one reviewed
//   add_entity         → label + duplicate check + insert
//   drop_entity        → remove by id
//
// and the two ways of getting it out:
//
//   render             → colourised view of the document
//   save / load        → JSON annotation file
//
// Suggestions skip add_entity on purpose: they are accepted as
// the model produced them, without review and without the
// duplicate check. Everything a human confirms goes through
// add_entity.
//
// The source text never changes after construction; spans only
// ever refer to it by character offset.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::data::matcher::{self, PhraseMatcher};
use crate::data::offsets::CharOffsets;
use crate::domain::document::Document;
use crate::domain::entity::{normalize_label, EntitySpan};
use crate::domain::error::AnnotationError;
use crate::domain::palette::{paint, ColorMap, Palette};
use crate::domain::traits::{Recognizer, Reviewer};
use crate::infra::session_store::SessionStore;

// ─── Search options ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Regular expression to look for
    pub phrase: String,
    /// Case-sensitive unless turned off
    pub match_case: bool,
    /// Label given to every accepted match; asked per match if None
    pub label: Option<String>,
    /// Characters of context shown either side of a match
    pub context_len: usize,
}

impl SearchQuery {
    pub const DEFAULT_CONTEXT_LEN: usize = 30;

    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase:      phrase.into(),
            match_case:  true,
            label:       None,
            context_len: Self::DEFAULT_CONTEXT_LEN,
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.match_case = false;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_context_len(mut self, context_len: usize) -> Self {
        self.context_len = context_len;
        self
    }
}

// ─── Outcomes ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The span was appended
    Added(EntitySpan),
    /// An identical span (ignoring id) was already stored
    AlreadyExists { existing_id: String },
}

/// What happened during one search_and_confirm call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchReport {
    pub matches:    usize,
    pub added:      Vec<EntitySpan>,
    pub duplicates: usize,
    pub declined:   usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// The file existed and the reviewer declined to overwrite it
    Skipped,
}

/// A rendered view: colour legend plus the colourised text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub legend: ColorMap,
    pub body:   String,
}

impl fmt::Display for RenderedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "COLOR-ENTITY KEY:")?;
        for (label, color) in self.legend.entries() {
            writeln!(f, "{}", paint(color, label))?;
        }
        writeln!(f)?;
        write!(f, "{}", self.body)
    }
}

// ─── AnnotationSession ────────────────────────────────────────────────────────
// Field names on disk follow the established annotation file
// layout: {"raw_text": ..., "entities": [...]}.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSession {
    #[serde(rename = "raw_text")]
    source_text: String,

    #[serde(rename = "entities", default)]
    spans: Vec<EntitySpan>,
}

impl AnnotationSession {
    pub fn new(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            spans:       Vec::new(),
        }
    }

    pub fn from_document(doc: Document) -> Self {
        Self::new(doc.text)
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Spans in insertion order
    pub fn spans(&self) -> &[EntitySpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, entity_id: &str) -> Option<&EntitySpan> {
        self.spans.iter().find(|s| s.id == entity_id)
    }

    /// Distinct labels in first-seen order
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for label in self.spans.iter().filter_map(|s| s.label.as_deref()) {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }

    /// Run the recognizer once over the whole text and append every
    /// candidate it returns, unreviewed. Returns the new spans.
    ///
    /// Nothing is appended if any candidate has invalid offsets.
    /// Candidates with a blank label are skipped.
    pub fn suggest_entities(&mut self, recognizer: &dyn Recognizer) -> Result<Vec<EntitySpan>> {
        let candidates = recognizer
            .recognize(&self.source_text)
            .context("Recognizer failed")?;

        let offsets = CharOffsets::new(&self.source_text);
        let mut accepted = Vec::with_capacity(candidates.len());

        for c in candidates {
            let text = checked_slice(&offsets, c.start_idx, c.end_idx)?;
            let Some(label) = normalize_label(&c.label) else {
                tracing::warn!(
                    "Skipping unlabelled suggestion '{}' at {}..{}",
                    text,
                    c.start_idx,
                    c.end_idx
                );
                continue;
            };
            accepted.push(EntitySpan::new(text, c.start_idx, c.end_idx, Some(label)));
        }

        for span in &accepted {
            tracing::info!(
                "Suggested {} '{}' {}",
                span.id,
                span.text,
                span.label.as_deref().unwrap_or("-")
            );
        }

        self.spans.extend(accepted.iter().cloned());
        Ok(accepted)
    }

    /// Search for `query.phrase` and ask the reviewer about each
    /// match in source order. Accepted matches go through
    /// add_entity; declined ones leave no trace.
    pub fn search_and_confirm(
        &mut self,
        query:    &SearchQuery,
        reviewer: &mut dyn Reviewer,
    ) -> Result<SearchReport> {
        let phrase_matcher = PhraseMatcher::new(&query.phrase, query.match_case)?;
        let matches = phrase_matcher.find_all(&self.source_text);

        let mut report = SearchReport {
            matches: matches.len(),
            ..SearchReport::default()
        };

        if matches.is_empty() {
            tracing::info!(
                "There were no matches for '{}'. Check spelling or try not matching on case.",
                query.phrase
            );
            return Ok(report);
        }

        tracing::info!("There were {} matching phrases in the text", matches.len());

        let fixed_label = query.label.as_deref().and_then(normalize_label);

        for (i, m) in matches.iter().enumerate() {
            let preview = matcher::preview(
                &self.source_text,
                m,
                query.context_len,
                i + 1,
                matches.len(),
            );

            if !reviewer.confirm_match(&preview)? {
                tracing::debug!("Declined match at {}..{}", m.start_idx, m.end_idx);
                report.declined += 1;
                continue;
            }

            let candidate = EntitySpan::new(
                m.text.clone(),
                m.start_idx,
                m.end_idx,
                fixed_label.clone(),
            );

            match self.add_entity(candidate, reviewer)? {
                AddOutcome::Added(span)          => report.added.push(span),
                AddOutcome::AlreadyExists { .. } => report.duplicates += 1,
            }
        }

        Ok(report)
    }

    /// Label the candidate if needed, then insert it unless an
    /// identical span (same text, offsets and label) is stored.
    pub fn add_entity(
        &mut self,
        mut candidate: EntitySpan,
        reviewer:      &mut dyn Reviewer,
    ) -> Result<AddOutcome> {
        let offsets = CharOffsets::new(&self.source_text);
        let actual  = checked_slice(&offsets, candidate.start_idx, candidate.end_idx)?;
        if actual != candidate.text {
            return Err(inconsistent(&candidate, actual).into());
        }

        let label = match candidate.label.as_deref().and_then(normalize_label) {
            Some(label) => label,
            None        => ask_label(&candidate, reviewer)?,
        };
        candidate.label = Some(label);

        if let Some(existing) = self.spans.iter().find(|s| s.same_annotation(&candidate)) {
            tracing::info!("Entity already exists as {}", existing.id);
            return Ok(AddOutcome::AlreadyExists {
                existing_id: existing.id.clone(),
            });
        }

        tracing::info!(
            "Entity added: {} '{}' {}",
            candidate.id,
            candidate.text,
            candidate.label.as_deref().unwrap_or("-")
        );
        self.spans.push(candidate.clone());
        Ok(AddOutcome::Added(candidate))
    }

    /// Remove the span with this id. Returns it, or None if no
    /// span has that id.
    pub fn drop_entity(&mut self, entity_id: &str) -> Option<EntitySpan> {
        let Some(pos) = self.spans.iter().position(|s| s.id == entity_id) else {
            tracing::warn!("No entity with id '{}'", entity_id);
            return None;
        };

        let removed = self.spans.remove(pos);
        tracing::info!(
            "Removed entity {} '{}' {}",
            removed.id,
            removed.text,
            removed.label.as_deref().unwrap_or("-")
        );
        Some(removed)
    }

    /// Colourise the document. With `focus_labels`, only spans with
    /// those labels are coloured; the rest print as plain text.
    ///
    /// Spans are assumed not to overlap. Overlapping spans repeat
    /// the shared text in the output.
    pub fn render(
        &self,
        focus_labels: Option<&[String]>,
        palette:      &Palette,
    ) -> Result<RenderedDocument, AnnotationError> {
        let focus: Option<Vec<String>> = focus_labels
            .map(|labels| labels.iter().filter_map(|l| normalize_label(l)).collect());
        let in_focus = |label: &str| {
            focus
                .as_ref()
                .map_or(true, |f| f.iter().any(|l| l == label))
        };

        let legend = palette.assign(self.labels().into_iter().filter(|l| in_focus(*l)))?;

        let offsets = CharOffsets::new(&self.source_text);

        // sort_by_key is stable: equal starts keep insertion order
        let mut ordered: Vec<&EntitySpan> = self.spans.iter().collect();
        ordered.sort_by_key(|s| s.start_idx);

        let mut body   = String::with_capacity(self.source_text.len());
        let mut cursor = 0usize;
        let mut previous: Option<&EntitySpan> = None;

        for span in ordered {
            if let Some(prev) = previous.filter(|p| p.overlaps(span)) {
                tracing::warn!(
                    "Entities {} and {} overlap; shared text is repeated",
                    prev.id,
                    span.id
                );
            }
            previous = Some(span);

            body.push_str(offsets.slice(cursor, span.start_idx).unwrap_or_default());

            let text = offsets.slice(span.start_idx, span.end_idx).unwrap_or_default();
            match span.label.as_deref().and_then(|l| legend.color_of(l)) {
                Some(color) => body.push_str(&paint(color, text)),
                None        => body.push_str(text),
            }

            cursor = span.end_idx;
        }

        body.push_str(offsets.slice(cursor, offsets.char_len()).unwrap_or_default());

        Ok(RenderedDocument { legend, body })
    }

    /// Write the session to `path`. An existing file is replaced
    /// only if the reviewer confirms.
    pub fn save(&self, path: &Path, reviewer: &mut dyn Reviewer) -> Result<SaveOutcome> {
        let store = SessionStore::new(path);

        if store.exists() && !reviewer.confirm_overwrite(path)? {
            tracing::warn!("'{}' left unchanged", path.display());
            return Ok(SaveOutcome::Skipped);
        }

        store.write(self)?;
        tracing::info!("Saved {} entities to '{}'", self.spans.len(), path.display());
        Ok(SaveOutcome::Written)
    }

    /// Read a saved session and check every span against its text.
    pub fn load(path: &Path) -> Result<Self> {
        let session: Self = SessionStore::new(path).read()?;
        session
            .validate()
            .with_context(|| format!("'{}' has invalid entities", path.display()))?;

        tracing::info!(
            "Loaded {} entities from '{}'",
            session.spans.len(),
            path.display()
        );
        Ok(session)
    }

    fn validate(&self) -> Result<(), AnnotationError> {
        let offsets = CharOffsets::new(&self.source_text);
        let mut ids = HashSet::new();

        for span in &self.spans {
            if !ids.insert(span.id.as_str()) {
                return Err(AnnotationError::DuplicateId(span.id.clone()));
            }
            let actual = checked_slice(&offsets, span.start_idx, span.end_idx)?;
            if actual != span.text {
                return Err(inconsistent(span, actual));
            }
            if let Some(label) = &span.label {
                if normalize_label(label).as_ref() != Some(label) {
                    return Err(AnnotationError::UnnormalisedLabel {
                        id:    span.id.clone(),
                        label: label.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Keep asking until the reviewer gives a non-blank label
fn ask_label(candidate: &EntitySpan, reviewer: &mut dyn Reviewer) -> Result<String> {
    loop {
        let raw = reviewer.request_label(candidate)?;
        if let Some(label) = normalize_label(&raw) {
            return Ok(label);
        }
        tracing::warn!("Label cannot be an empty string");
    }
}

/// Slice a non-empty, in-range character span
fn checked_slice<'a>(
    offsets: &CharOffsets<'a>,
    start:   usize,
    end:     usize,
) -> Result<&'a str, AnnotationError> {
    let out_of_bounds = AnnotationError::SpanOutOfBounds {
        start,
        end,
        len: offsets.char_len(),
    };
    if start >= end {
        return Err(out_of_bounds);
    }
    offsets.slice(start, end).ok_or(out_of_bounds)
}

fn inconsistent(span: &EntitySpan, actual: &str) -> AnnotationError {
    AnnotationError::InconsistentSpan {
        id:     span.id.clone(),
        start:  span.start_idx,
        end:    span.end_idx,
        stored: span.text.clone(),
        actual: actual.to_string(),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::RecognizedEntity;
    use crate::domain::palette::Overflow;
    use crate::domain::traits::MatchPreview;
    use std::collections::VecDeque;

    const TEXT: &str = "Alice met Bob in Paris.";

    /// Answers from queues; records what it was shown.
    #[derive(Default)]
    struct ScriptedReviewer {
        accept:    VecDeque<bool>,
        labels:    VecDeque<String>,
        overwrite: bool,
        shown:     Vec<MatchPreview>,
        label_requests: usize,
    }

    impl ScriptedReviewer {
        fn accepting(n: usize) -> Self {
            Self { accept: vec![true; n].into(), ..Self::default() }
        }

        fn declining(n: usize) -> Self {
            Self { accept: vec![false; n].into(), ..Self::default() }
        }

        fn with_labels(mut self, labels: &[&str]) -> Self {
            self.labels = labels.iter().map(|l| l.to_string()).collect();
            self
        }
    }

    impl Reviewer for ScriptedReviewer {
        fn confirm_match(&mut self, preview: &MatchPreview) -> Result<bool> {
            self.shown.push(preview.clone());
            self.accept
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("unexpected match prompt"))
        }

        fn request_label(&mut self, _candidate: &EntitySpan) -> Result<String> {
            self.label_requests += 1;
            self.labels
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("unexpected label prompt"))
        }

        fn confirm_overwrite(&mut self, _path: &Path) -> Result<bool> {
            Ok(self.overwrite)
        }
    }

    struct FixedRecognizer(Vec<RecognizedEntity>);

    impl Recognizer for FixedRecognizer {
        fn recognize(&self, _text: &str) -> Result<Vec<RecognizedEntity>> {
            Ok(self.0.clone())
        }
    }

    struct FailingRecognizer;

    impl Recognizer for FailingRecognizer {
        fn recognize(&self, _text: &str) -> Result<Vec<RecognizedEntity>> {
            anyhow::bail!("model not loaded")
        }
    }

    fn labelled(session: &AnnotationSession, start: usize, end: usize, label: &str) -> EntitySpan {
        let text = CharOffsets::new(session.source_text())
            .slice(start, end)
            .unwrap()
            .to_string();
        EntitySpan::new(text, start, end, Some(label.to_string()))
    }

    fn visible(rendered: &RenderedDocument) -> String {
        console::strip_ansi_codes(&rendered.body).to_string()
    }

    // ── suggest_entities ──────────────────────────────────────────────────────

    #[test]
    fn test_suggestions_are_auto_accepted() {
        let mut session = AnnotationSession::new(TEXT);
        let recognizer  = FixedRecognizer(vec![
            RecognizedEntity::new(0, 5, "PERSON"),
            RecognizedEntity::new(17, 22, "GPE"),
        ]);

        let added = session.suggest_entities(&recognizer).unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(session.len(), 2);
        assert_eq!(session.spans()[0].text, "Alice");
        assert_eq!(session.spans()[1].text, "Paris");
        assert_eq!(session.spans()[1].label.as_deref(), Some("GPE"));
    }

    #[test]
    fn test_suggestions_skip_duplicate_check() {
        let mut session = AnnotationSession::new(TEXT);
        let recognizer  = FixedRecognizer(vec![RecognizedEntity::new(10, 13, "PERSON")]);

        session.suggest_entities(&recognizer).unwrap();
        session.suggest_entities(&recognizer).unwrap();
        assert_eq!(session.len(), 2);
        assert_ne!(session.spans()[0].id, session.spans()[1].id);
    }

    #[test]
    fn test_suggestion_out_of_bounds_inserts_nothing() {
        let mut session = AnnotationSession::new(TEXT);
        let recognizer  = FixedRecognizer(vec![
            RecognizedEntity::new(0, 5, "PERSON"),
            RecognizedEntity::new(20, 40, "GPE"),
        ]);

        let err = session.suggest_entities(&recognizer).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnnotationError>(),
            Some(AnnotationError::SpanOutOfBounds { .. })
        ));
        assert!(session.is_empty());
    }

    #[test]
    fn test_blank_suggestion_label_is_skipped() {
        let mut session = AnnotationSession::new(TEXT);
        let recognizer  = FixedRecognizer(vec![
            RecognizedEntity::new(0, 5, "  "),
            RecognizedEntity::new(10, 13, "person"),
        ]);

        let added = session.suggest_entities(&recognizer).unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(session.len(), 1);
        assert_eq!(session.spans()[0].text, "Bob");
        assert_eq!(session.spans()[0].label.as_deref(), Some("PERSON"));
    }

    #[test]
    fn test_recognizer_failure_propagates() {
        let mut session = AnnotationSession::new(TEXT);
        let err = session.suggest_entities(&FailingRecognizer).unwrap_err();
        assert!(format!("{err:#}").contains("model not loaded"));
        assert!(session.is_empty());
    }

    // ── search_and_confirm ────────────────────────────────────────────────────

    #[test]
    fn test_search_with_fixed_label() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::accepting(1);

        let report = session
            .search_and_confirm(&SearchQuery::new("Bob").with_label("PERSON"), &mut reviewer)
            .unwrap();

        assert_eq!(report.matches, 1);
        assert_eq!(report.added.len(), 1);
        let span = &session.spans()[0];
        assert_eq!(span.text, "Bob");
        assert_eq!((span.start_idx, span.end_idx), (10, 13));
        assert_eq!(span.label.as_deref(), Some("PERSON"));
        assert_eq!(reviewer.label_requests, 0);
    }

    #[test]
    fn test_search_ignoring_case_keeps_offsets() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::accepting(1);

        session
            .search_and_confirm(
                &SearchQuery::new("bob").ignore_case().with_label("person"),
                &mut reviewer,
            )
            .unwrap();

        let span = &session.spans()[0];
        assert_eq!((span.start_idx, span.end_idx), (10, 13));
        assert_eq!(span.text, "Bob");
        assert_eq!(span.label.as_deref(), Some("PERSON"));
    }

    #[test]
    fn test_search_with_no_matches_changes_nothing() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::default();

        let report = session
            .search_and_confirm(&SearchQuery::new("Carol"), &mut reviewer)
            .unwrap();

        assert_eq!(report, SearchReport::default());
        assert!(session.is_empty());
        assert!(reviewer.shown.is_empty());
    }

    #[test]
    fn test_all_declined_changes_nothing() {
        let text         = "Bob and Bob and Bob";
        let mut session  = AnnotationSession::new(text);
        let mut reviewer = ScriptedReviewer::declining(3);

        let report = session
            .search_and_confirm(&SearchQuery::new("Bob"), &mut reviewer)
            .unwrap();

        assert_eq!(report.matches, 3);
        assert_eq!(report.declined, 3);
        assert!(session.is_empty());
        assert_eq!(reviewer.label_requests, 0);
    }

    #[test]
    fn test_all_accepted_grows_by_match_count() {
        let text         = "Bob and Bob and Bob";
        let mut session  = AnnotationSession::new(text);
        let mut reviewer = ScriptedReviewer::accepting(3);

        let report = session
            .search_and_confirm(&SearchQuery::new("Bob").with_label("PERSON"), &mut reviewer)
            .unwrap();

        assert_eq!(report.added.len(), 3);
        assert_eq!(session.len(), 3);
        let starts: Vec<usize> = session.spans().iter().map(|s| s.start_idx).collect();
        assert_eq!(starts, vec![0, 8, 16]);
    }

    #[test]
    fn test_matches_are_reviewed_in_order_with_context() {
        let text         = "Bob and Bob";
        let mut session  = AnnotationSession::new(text);
        let mut reviewer = ScriptedReviewer { accept: vec![false, true].into(), ..Default::default() }
            .with_labels(&["person"]);

        session
            .search_and_confirm(&SearchQuery::new("Bob").with_context_len(4), &mut reviewer)
            .unwrap();

        assert_eq!(reviewer.shown.len(), 2);
        assert_eq!(reviewer.shown[0].position, 1);
        assert_eq!(reviewer.shown[0].after, " and");
        assert_eq!(reviewer.shown[1].before, "and ");
        assert_eq!(reviewer.shown[1].total, 2);
        assert_eq!(session.len(), 1);
        assert_eq!(session.spans()[0].start_idx, 8);
    }

    #[test]
    fn test_search_asks_for_label_until_non_blank() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::accepting(1).with_labels(&["", "   ", "gpe"]);

        session
            .search_and_confirm(&SearchQuery::new("Paris"), &mut reviewer)
            .unwrap();

        assert_eq!(reviewer.label_requests, 3);
        assert_eq!(session.spans()[0].label.as_deref(), Some("GPE"));
    }

    #[test]
    fn test_search_twice_reports_duplicate() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::accepting(2);
        let query        = SearchQuery::new("Bob").with_label("PERSON");

        session.search_and_confirm(&query, &mut reviewer).unwrap();
        let report = session.search_and_confirm(&query, &mut reviewer).unwrap();

        assert_eq!(report.duplicates, 1);
        assert!(report.added.is_empty());
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_empty_phrase_is_rejected() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::default();

        let err = session
            .search_and_confirm(&SearchQuery::new(""), &mut reviewer)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<AnnotationError>(),
            Some(&AnnotationError::EmptyPhrase)
        );
        assert!(session.is_empty());
    }

    // ── add_entity ────────────────────────────────────────────────────────────

    #[test]
    fn test_add_same_span_twice() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::default();
        let span         = labelled(&session, 10, 13, "PERSON");

        let first  = session.add_entity(span.clone(), &mut reviewer).unwrap();
        let second = session.add_entity(span.clone(), &mut reviewer).unwrap();

        assert_eq!(first, AddOutcome::Added(span.clone()));
        assert_eq!(second, AddOutcome::AlreadyExists { existing_id: span.id.clone() });
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_duplicate_check_ignores_id() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::default();

        session.add_entity(labelled(&session, 10, 13, "PERSON"), &mut reviewer).unwrap();
        let again = session
            .add_entity(labelled(&session, 10, 13, "PERSON"), &mut reviewer)
            .unwrap();
        assert!(matches!(again, AddOutcome::AlreadyExists { .. }));

        // Same offsets, different label: a distinct annotation
        let other = session
            .add_entity(labelled(&session, 10, 13, "ORG"), &mut reviewer)
            .unwrap();
        assert!(matches!(other, AddOutcome::Added(_)));
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_add_uppercases_given_label() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::default();

        session.add_entity(labelled(&session, 0, 5, " person "), &mut reviewer).unwrap();
        assert_eq!(session.spans()[0].label.as_deref(), Some("PERSON"));
    }

    #[test]
    fn test_add_rejects_text_not_matching_offsets() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::default();
        let bogus        = EntitySpan::new("Carol", 10, 13, Some("PERSON".into()));

        let err = session.add_entity(bogus, &mut reviewer).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnnotationError>(),
            Some(AnnotationError::InconsistentSpan { .. })
        ));
        assert!(session.is_empty());
    }

    // ── drop_entity ───────────────────────────────────────────────────────────

    #[test]
    fn test_drop_existing_entity() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::default();
        let alice        = labelled(&session, 0, 5, "PERSON");
        let bob          = labelled(&session, 10, 13, "PERSON");
        session.add_entity(alice.clone(), &mut reviewer).unwrap();
        session.add_entity(bob.clone(), &mut reviewer).unwrap();

        let removed = session.drop_entity(&alice.id);
        assert_eq!(removed, Some(alice.clone()));
        assert_eq!(session.len(), 1);
        assert!(session.get(&alice.id).is_none());
        assert!(session.get(&bob.id).is_some());
    }

    #[test]
    fn test_drop_missing_entity_is_noop() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::default();
        session.add_entity(labelled(&session, 0, 5, "PERSON"), &mut reviewer).unwrap();

        assert_eq!(session.drop_entity("no-such-id"), None);
        assert_eq!(session.len(), 1);
    }

    // ── render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_visible_text_equals_source() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::default();
        // Inserted out of order on purpose
        session.add_entity(labelled(&session, 17, 22, "GPE"), &mut reviewer).unwrap();
        session.add_entity(labelled(&session, 0, 5, "PERSON"), &mut reviewer).unwrap();
        session.add_entity(labelled(&session, 10, 13, "PERSON"), &mut reviewer).unwrap();

        let rendered = session.render(None, &Palette::standard()).unwrap();
        assert_eq!(visible(&rendered), TEXT);
        assert_eq!(rendered.legend.len(), 2);
        // First-seen order: GPE was added first
        assert_eq!(rendered.legend.entries()[0].0, "GPE");
        assert!(rendered.body.starts_with(&paint(rendered.legend.color_of("PERSON").unwrap(), "Alice")));
    }

    #[test]
    fn test_render_without_spans_is_plain_text() {
        let session  = AnnotationSession::new(TEXT);
        let rendered = session.render(None, &Palette::standard()).unwrap();
        assert_eq!(rendered.body, TEXT);
        assert!(rendered.legend.is_empty());
    }

    #[test]
    fn test_render_multibyte_text() {
        let mut session  = AnnotationSession::new("Zoë visited Köln.");
        let mut reviewer = ScriptedReviewer::default();
        session.add_entity(labelled(&session, 12, 16, "GPE"), &mut reviewer).unwrap();
        session.add_entity(labelled(&session, 0, 3, "PERSON"), &mut reviewer).unwrap();

        let rendered = session.render(None, &Palette::standard()).unwrap();
        assert_eq!(visible(&rendered), "Zoë visited Köln.");
    }

    #[test]
    fn test_render_focus_colours_only_focused_labels() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::default();
        session.add_entity(labelled(&session, 0, 5, "PERSON"), &mut reviewer).unwrap();
        session.add_entity(labelled(&session, 17, 22, "GPE"), &mut reviewer).unwrap();

        let focus    = vec!["gpe".to_string()];
        let rendered = session.render(Some(&focus), &Palette::standard()).unwrap();

        assert_eq!(rendered.legend.len(), 1);
        assert!(rendered.body.starts_with("Alice met"));
        assert_eq!(visible(&rendered), TEXT);
    }

    #[test]
    fn test_render_nested_spans_repeat_text() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::default();
        session.add_entity(labelled(&session, 0, 13, "EVENT"), &mut reviewer).unwrap();
        session.add_entity(labelled(&session, 6, 9, "ACTION"), &mut reviewer).unwrap();

        let rendered = session.render(None, &Palette::standard()).unwrap();
        // The inner span follows the outer one and the cursor moves
        // back to its end, so " Bob" appears twice
        assert_eq!(visible(&rendered), "Alice met Bobmet Bob in Paris.");
        assert_eq!(rendered.legend.len(), 2);
    }

    #[test]
    fn test_render_rejects_sixth_label() {
        let text         = "a b c d e f";
        let mut session  = AnnotationSession::new(text);
        let mut reviewer = ScriptedReviewer::default();
        for (i, label) in ["A", "B", "C", "D", "E", "F"].iter().enumerate() {
            session.add_entity(labelled(&session, i * 2, i * 2 + 1, label), &mut reviewer).unwrap();
        }

        let err = session.render(None, &Palette::standard()).unwrap_err();
        assert_eq!(err, AnnotationError::TooManyLabels { found: 6, capacity: 5 });

        let cycled = session
            .render(None, &Palette::standard().with_overflow(Overflow::Cycle))
            .unwrap();
        assert_eq!(visible(&cycled), text);

        // Focusing on five of them fits the palette again
        let focus: Vec<String> = ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect();
        assert!(session.render(Some(&focus), &Palette::standard()).is_ok());
    }

    #[test]
    fn test_render_display_has_legend_then_body() {
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::default();
        session.add_entity(labelled(&session, 10, 13, "PERSON"), &mut reviewer).unwrap();

        let shown = session.render(None, &Palette::standard()).unwrap().to_string();
        let plain = console::strip_ansi_codes(&shown).to_string();
        assert_eq!(plain, format!("COLOR-ENTITY KEY:\nPERSON\n\n{TEXT}"));
    }

    // ── save / load ───────────────────────────────────────────────────────────

    #[test]
    fn test_save_then_load_round_trip() {
        let dir          = tempfile::tempdir().unwrap();
        let path         = dir.path().join("doc.json");
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::default();
        session.add_entity(labelled(&session, 17, 22, "GPE"), &mut reviewer).unwrap();
        session.add_entity(labelled(&session, 0, 5, "PERSON"), &mut reviewer).unwrap();

        assert_eq!(session.save(&path, &mut reviewer).unwrap(), SaveOutcome::Written);

        let loaded = AnnotationSession::load(&path).unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.spans()[0].text, "Paris");
    }

    #[test]
    fn test_saved_layout() {
        let dir          = tempfile::tempdir().unwrap();
        let path         = dir.path().join("doc.json");
        let mut session  = AnnotationSession::new(TEXT);
        let mut reviewer = ScriptedReviewer::default();
        session.add_entity(labelled(&session, 10, 13, "PERSON"), &mut reviewer).unwrap();
        session.save(&path, &mut reviewer).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["raw_text"], TEXT);
        assert_eq!(json["entities"][0]["text"], "Bob");
        assert_eq!(json["entities"][0]["start_idx"], 10);
        assert_eq!(json["entities"][0]["end_idx"], 13);
        assert_eq!(json["entities"][0]["label"], "PERSON");
    }

    #[test]
    fn test_existing_file_needs_confirmation() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "keep me").unwrap();

        let session      = AnnotationSession::new(TEXT);
        let mut declines = ScriptedReviewer::default();
        assert_eq!(session.save(&path, &mut declines).unwrap(), SaveOutcome::Skipped);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");

        let mut confirms = ScriptedReviewer { overwrite: true, ..Default::default() };
        assert_eq!(session.save(&path, &mut confirms).unwrap(), SaveOutcome::Written);
        assert!(AnnotationSession::load(&path).is_ok());
    }

    #[test]
    fn test_load_rejects_inconsistent_span() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(
            &path,
            r#"{"raw_text": "Alice met Bob", "entities": [
                {"id": "x", "text": "Bob", "start_idx": 10, "end_idx": 20, "label": "PERSON"}
            ]}"#,
        )
        .unwrap();

        assert!(AnnotationSession::load(&path).is_err());
    }

    #[test]
    fn test_load_rejects_unnormalised_label() {
        let dir = tempfile::tempdir().unwrap();
        for label in ["\"  lower \"", "\"\"", "\"Person\""] {
            let path = dir.path().join("doc.json");
            let json = format!(
                r#"{{"raw_text": "Alice met Bob", "entities": [
                    {{"id": "x", "text": "Bob", "start_idx": 10, "end_idx": 13, "label": {label}}}
                ]}}"#
            );
            std::fs::write(&path, json).unwrap();

            let err = AnnotationSession::load(&path).unwrap_err();
            assert!(matches!(
                err.root_cause().downcast_ref::<AnnotationError>(),
                Some(AnnotationError::UnnormalisedLabel { .. })
            ));
        }
    }

    #[test]
    fn test_load_accepts_unset_label() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(
            &path,
            r#"{"raw_text": "Alice met Bob", "entities": [
                {"id": "x", "text": "Bob", "start_idx": 10, "end_idx": 13, "label": null}
            ]}"#,
        )
        .unwrap();

        let session = AnnotationSession::load(&path).unwrap();
        assert_eq!(session.spans()[0].label, None);
    }

    #[test]
    fn test_load_rejects_duplicate_ids() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(
            &path,
            r#"{"raw_text": "Alice met Bob", "entities": [
                {"id": "x", "text": "Alice", "start_idx": 0, "end_idx": 5, "label": "PERSON"},
                {"id": "x", "text": "Bob", "start_idx": 10, "end_idx": 13, "label": "PERSON"}
            ]}"#,
        )
        .unwrap();

        assert!(AnnotationSession::load(&path).is_err());
    }

    #[test]
    fn test_load_without_entities_key() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"raw_text": "Alice"}"#).unwrap();

        let session = AnnotationSession::load(&path).unwrap();
        assert_eq!(session.source_text(), "Alice");
        assert!(session.is_empty());
    }
}
