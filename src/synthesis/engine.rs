//! Synthesis engine: merges input channels into one coherent narrative.
//!
//! Handles initial note creation and full resynthesis from accumulated
//! history. One bounded backend call per pass, no retries; every failure
//! path resolves to a deterministic degraded outcome.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::backends::CompletionBackend;
use crate::domain::extraction::ExtractionResult;
use crate::domain::input::{InputKind, RawInput};

use super::normalizer::{self, FallbackContext};
use super::prompts;
use super::SynthesisContext;

/// Title used for the empty-input sentinel outcome
pub const EMPTY_NOTE_TITLE: &str = "Empty Note";

/// Separator between joined input contributions
pub const CONTENT_SEPARATOR: &str = "\n\n";

/// Result of a synthesis pass: the merged narrative plus its extraction.
///
/// The narrative is a distinct artifact; it may or may not equal the
/// normalized summary.
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    pub narrative: String,
    pub extraction: ExtractionResult,
}

/// Narrative field of a synthesis response, read independently of the
/// extraction side.
#[derive(Debug, Deserialize)]
struct NarrativeOnly {
    #[serde(default)]
    narrative: Option<String>,
}

/// Merges text and audio inputs into a single note.
pub struct SynthesisEngine {
    backend: Option<Arc<dyn CompletionBackend>>,
    timeout: Duration,
}

impl SynthesisEngine {
    /// Create an engine. `backend: None` runs in degraded mode with
    /// deterministic mock extraction.
    pub fn new(backend: Option<Arc<dyn CompletionBackend>>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Engine with no extraction backend (deterministic fallbacks only)
    pub fn degraded() -> Self {
        Self::new(None, Duration::from_secs(60))
    }

    pub fn is_degraded(&self) -> bool {
        self.backend.is_none()
    }

    pub(crate) fn backend(&self) -> Option<&Arc<dyn CompletionBackend>> {
        self.backend.as_ref()
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Merge typed text and/or an audio transcript into one narrative plus
    /// an extraction result.
    ///
    /// Both inputs empty yields the sentinel "empty note" outcome without
    /// touching the backend.
    #[instrument(skip_all, fields(text_len = text_input.len(), audio_len = audio_transcript.len()))]
    pub async fn synthesize(
        &self,
        text_input: &str,
        audio_transcript: &str,
        ctx: &SynthesisContext,
    ) -> Result<SynthesisOutcome> {
        let text = text_input.trim();
        let audio = audio_transcript.trim();

        if text.is_empty() && audio.is_empty() {
            debug!("both inputs empty, returning sentinel outcome");
            return Ok(SynthesisOutcome {
                narrative: String::new(),
                extraction: ExtractionResult::empty(EMPTY_NOTE_TITLE),
            });
        }

        let combined = join_nonempty(&[text, audio]);

        let Some(backend) = &self.backend else {
            debug!("no backend configured, degraded synthesis");
            return Ok(degraded_outcome(combined));
        };

        let prompt = prompts::synthesis_prompt(&combined, ctx);
        let raw = match backend.complete(&prompt, self.timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "backend call failed, degrading");
                return Ok(degraded_outcome(combined));
            }
        };

        let narrative = parse_narrative(&raw).unwrap_or_else(|| combined.clone());
        let extraction = normalizer::normalize(&raw, &FallbackContext::new(&combined));

        Ok(SynthesisOutcome {
            narrative,
            extraction,
        })
    }

    /// Re-derive the full narrative from the complete input history.
    ///
    /// The history is partitioned by kind (order preserved within each kind)
    /// and forwarded to `synthesize` as two joined channels. The prior
    /// narrative is never consulted.
    #[instrument(skip_all, fields(inputs = history.len()))]
    pub async fn resynthesize(
        &self,
        history: &[RawInput],
        ctx: &SynthesisContext,
    ) -> Result<SynthesisOutcome> {
        let (text_joined, audio_joined) = partition_history(history);
        self.synthesize(&text_joined, &audio_joined, ctx).await
    }

    /// Extraction-only pass over an existing transcript.
    #[instrument(skip_all, fields(transcript_len = transcript.len()))]
    pub async fn analyze(
        &self,
        transcript: &str,
        ctx: &SynthesisContext,
    ) -> Result<ExtractionResult> {
        let Some(backend) = &self.backend else {
            return Ok(normalizer::degraded_extraction(transcript));
        };

        let prompt = prompts::extraction_prompt(transcript, ctx);
        let raw = match backend.complete(&prompt, self.timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "backend call failed, degrading");
                return Ok(normalizer::degraded_extraction(transcript));
            }
        };

        Ok(normalizer::normalize(
            &raw,
            &FallbackContext::new(transcript),
        ))
    }
}

/// Partition an input history into (text, audio) channels, preserving
/// intra-kind order and joining with a blank line.
pub fn partition_history(history: &[RawInput]) -> (String, String) {
    let text: Vec<&str> = history
        .iter()
        .filter(|i| i.kind == InputKind::Text)
        .map(|i| i.content.as_str())
        .collect();

    let audio: Vec<&str> = history
        .iter()
        .filter(|i| i.kind == InputKind::Audio)
        .map(|i| i.content.as_str())
        .collect();

    (text.join(CONTENT_SEPARATOR), audio.join(CONTENT_SEPARATOR))
}

/// Join non-empty pieces with the content separator.
pub fn join_nonempty(pieces: &[&str]) -> String {
    pieces
        .iter()
        .filter(|p| !p.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(CONTENT_SEPARATOR)
}

/// Degraded outcome: combined content becomes the narrative verbatim.
fn degraded_outcome(combined: String) -> SynthesisOutcome {
    let extraction = normalizer::degraded_extraction(&combined);
    SynthesisOutcome {
        narrative: combined,
        extraction,
    }
}

/// Read the narrative field out of a synthesis response, if parseable.
fn parse_narrative(raw: &str) -> Option<String> {
    let unfenced = normalizer::strip_code_fence(raw);
    serde_json::from_str::<NarrativeOnly>(unfenced)
        .ok()
        .and_then(|n| n.narrative)
        .filter(|n| !n.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::testing::RecordingBackend;
    use crate::domain::extraction::FALLBACK_FOLDER;

    fn ctx() -> SynthesisContext {
        SynthesisContext::default()
    }

    #[tokio::test]
    async fn test_empty_inputs_sentinel() {
        // Backend present but must not be called
        let backend = Arc::new(RecordingBackend::with_response("{}"));
        let engine = SynthesisEngine::new(Some(backend.clone()), Duration::from_secs(5));

        let outcome = engine.synthesize("", "", &ctx()).await.unwrap();

        assert_eq!(outcome.narrative, "");
        assert_eq!(outcome.extraction.title, EMPTY_NOTE_TITLE);
        assert_eq!(outcome.extraction.folder, FALLBACK_FOLDER);
        assert_eq!(outcome.extraction.draft_count(), 0);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_single_input_forwarded_alone() {
        let backend = Arc::new(RecordingBackend::with_response("not json"));
        let engine = SynthesisEngine::new(Some(backend.clone()), Duration::from_secs(5));

        let outcome = engine.synthesize("", "only the audio", &ctx()).await.unwrap();

        // Malformed response: narrative falls back to the combined content
        assert_eq!(outcome.narrative, "only the audio");
        let prompt = backend.last_prompt().unwrap();
        assert!(prompt.contains("only the audio"));
    }

    #[tokio::test]
    async fn test_both_inputs_joined_with_separator() {
        let engine = SynthesisEngine::degraded();

        let outcome = engine
            .synthesize("typed text", "spoken text", &ctx())
            .await
            .unwrap();

        assert_eq!(outcome.narrative, "typed text\n\nspoken text");
    }

    #[tokio::test]
    async fn test_degraded_narrative_is_verbatim() {
        let engine = SynthesisEngine::degraded();

        let outcome = engine.synthesize("hello world", "", &ctx()).await.unwrap();

        assert_eq!(outcome.narrative, "hello world");
        assert_eq!(outcome.extraction.title, "hello world");
        assert_eq!(outcome.extraction.folder, FALLBACK_FOLDER);
        assert_eq!(outcome.extraction.draft_count(), 0);
    }

    #[tokio::test]
    async fn test_parsed_narrative_used_when_present() {
        let response = r#"{"narrative": "A clean merged story.", "title": "Story", "folder": "Ideas"}"#;
        let backend = Arc::new(RecordingBackend::with_response(response));
        let engine = SynthesisEngine::new(Some(backend), Duration::from_secs(5));

        let outcome = engine.synthesize("raw input", "", &ctx()).await.unwrap();

        assert_eq!(outcome.narrative, "A clean merged story.");
        assert_eq!(outcome.extraction.title, "Story");
        assert_eq!(outcome.extraction.folder, "Ideas");
    }

    #[tokio::test]
    async fn test_backend_failure_degrades() {
        let backend = Arc::new(RecordingBackend::failing("connection refused"));
        let engine = SynthesisEngine::new(Some(backend), Duration::from_secs(5));

        let outcome = engine.synthesize("some content", "", &ctx()).await.unwrap();

        assert_eq!(outcome.narrative, "some content");
        assert_eq!(outcome.extraction.draft_count(), 0);
    }

    #[test]
    fn test_partition_preserves_intra_kind_order() {
        let history = vec![
            RawInput::text("A"),
            RawInput::audio("B", 5.0),
            RawInput::text("C"),
        ];

        let (text, audio) = partition_history(&history);
        assert_eq!(text, "A\n\nC");
        assert_eq!(audio, "B");
    }

    #[tokio::test]
    async fn test_resynthesize_joins_history() {
        let engine = SynthesisEngine::degraded();
        let history = vec![
            RawInput::text("first thought"),
            RawInput::audio("a recording", 3.0),
            RawInput::text("second thought"),
        ];

        let outcome = engine.resynthesize(&history, &ctx()).await.unwrap();

        // Degraded: text channel then audio channel, blank-line separated
        assert_eq!(
            outcome.narrative,
            "first thought\n\nsecond thought\n\na recording"
        );
    }

    #[tokio::test]
    async fn test_analyze_degraded() {
        let engine = SynthesisEngine::degraded();
        let result = engine.analyze("call mom tomorrow", &ctx()).await.unwrap();

        assert_eq!(result.title, "call mom tomorrow");
        assert_eq!(result.draft_count(), 0);
    }
}
