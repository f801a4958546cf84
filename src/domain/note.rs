//! Note documents and the read-only view the core consumes.
//!
//! `NoteRecord` is the persisted shape used by the file store and CLI. The
//! synthesis core never fetches notes itself; it receives an `ExistingNote`
//! view assembled by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::action::Action;
use super::extraction::ExtractionResult;
use super::input::RawInput;

/// A persisted note: narrative plus the input history it was derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: Uuid,

    pub title: String,

    /// The single cohesive text representation of the note
    pub narrative: String,

    pub summary: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub folder: String,

    /// Cumulative audio duration across all recordings, in seconds
    #[serde(default)]
    pub duration_seconds: f64,

    /// Ordered, append-only input history
    #[serde(default)]
    pub inputs: Vec<RawInput>,

    #[serde(default)]
    pub actions: Vec<Action>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl NoteRecord {
    /// Create a note from a synthesis pass over the given inputs
    pub fn new(narrative: String, extraction: &ExtractionResult, inputs: Vec<RawInput>) -> Self {
        let now = Utc::now();
        let duration_seconds = inputs
            .iter()
            .filter_map(|i| i.audio_duration_seconds)
            .sum();

        Self {
            id: Uuid::new_v4(),
            title: extraction.title.clone(),
            narrative,
            summary: extraction.summary.clone(),
            tags: extraction.tags.clone(),
            folder: extraction.folder.clone(),
            duration_seconds,
            inputs,
            actions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Read-only view of this note for the decision engine
    pub fn as_existing(&self) -> ExistingNote<'_> {
        ExistingNote {
            title: &self.title,
            narrative: &self.narrative,
            summary: self.summary.as_deref(),
            folder: &self.folder,
            tags: &self.tags,
            inputs: &self.inputs,
        }
    }

    /// Word count of the current narrative
    pub fn narrative_word_count(&self) -> usize {
        self.narrative.split_whitespace().count()
    }
}

/// Borrowed view of an existing note, as supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct ExistingNote<'a> {
    pub title: &'a str,
    pub narrative: &'a str,
    pub summary: Option<&'a str>,
    pub folder: &'a str,
    pub tags: &'a [String],
    pub inputs: &'a [RawInput],
}

impl ExistingNote<'_> {
    pub fn narrative_word_count(&self) -> usize {
        self.narrative.split_whitespace().count()
    }
}
