//! Raw inputs: the append-only history behind a note.
//!
//! Every contribution to a note (typed text or a transcribed recording) is
//! recorded as an immutable `RawInput`. Derived state (narrative, tags,
//! summary) is always recomputed from this history, never mutated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The channel a contribution arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Typed directly by the user
    Text,

    /// Transcribed from an audio recording
    Audio,
}

/// One atomic contribution to a note.
///
/// Immutable once created; appended to the note's ordered input history and
/// never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInput {
    /// Text or audio
    pub kind: InputKind,

    /// The text itself, or the audio's transcription
    pub content: String,

    /// When this input was captured
    pub timestamp: DateTime<Utc>,

    /// Recording length in seconds (audio only)
    pub audio_duration_seconds: Option<f64>,

    /// Content-addressed storage key for the audio file (audio only)
    pub audio_storage_key: Option<String>,
}

impl RawInput {
    /// Create a text input captured now
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: InputKind::Text,
            content: content.into(),
            timestamp: Utc::now(),
            audio_duration_seconds: None,
            audio_storage_key: None,
        }
    }

    /// Create an audio input (transcription) captured now
    pub fn audio(content: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            kind: InputKind::Audio,
            content: content.into(),
            timestamp: Utc::now(),
            audio_duration_seconds: Some(duration_seconds),
            audio_storage_key: None,
        }
    }

    /// Attach a storage key for the source audio
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.audio_storage_key = Some(key.into());
        self
    }

    /// Word count of this input's content
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}
