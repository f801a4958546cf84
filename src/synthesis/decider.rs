//! Update-strategy decider: append vs. resynthesize for existing notes.
//!
//! Two phases per invocation, stateless given its inputs:
//! 1. deterministic heuristic pre-checks, evaluated in fixed priority order
//! 2. a model-assisted decision, only reached when no heuristic fires
//!
//! Callers follow append-then-decide: the new input is pushed onto the note
//! history exactly once, before this decider runs. The history passed in
//! therefore already contains the new content; `new_content` is supplied
//! separately for the word-count heuristics and append concatenation.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::backends::CompletionBackend;
use crate::domain::extraction::ExtractionResult;
use crate::domain::note::ExistingNote;

use super::engine::{join_nonempty, SynthesisEngine, SynthesisOutcome};
use super::normalizer::{self, FallbackContext};
use super::prompts;
use super::SynthesisContext;

/// How new content should be merged into an existing note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    /// Preserve the existing narrative and concatenate
    Append,

    /// Regenerate the entire narrative from the full input history
    Resynthesize,
}

impl std::fmt::Display for UpdateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Append => write!(f, "append"),
            Self::Resynthesize => write!(f, "resynthesize"),
        }
    }
}

/// The decision, always paired with a full (never incremental) outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDecision {
    pub update_type: UpdateType,

    /// Confidence in the decision, 0.0 to 1.0
    pub confidence: f64,

    /// Human-readable explanation
    pub reason: String,
}

/// Word counts and history length feeding the phase-1 heuristics.
#[derive(Debug, Clone, Copy)]
struct HeuristicMetrics {
    new_words: usize,
    existing_words: usize,
    history_len: usize,
}

/// Phase-1 pre-checks in priority order; the first match wins and forces a
/// resynthesis without consulting the backend.
const PHASE_ONE_HEURISTICS: &[(fn(&HeuristicMetrics) -> bool, &str)] = &[
    (
        |m| m.existing_words > 0 && m.new_words * 2 > m.existing_words,
        "new content substantial relative to existing note",
    ),
    (
        |m| m.history_len >= 5,
        "multiple fragmented inputs benefit from full synthesis",
    ),
    (
        |m| m.existing_words < 50,
        "short note benefits from full synthesis",
    ),
];

/// Word-count threshold below which degraded mode appends
const DEGRADED_APPEND_WORDS: usize = 50;

/// Model response shape for the decision fields. The extraction side of the
/// same response goes through the normalizer separately.
#[derive(Debug, Default, Deserialize)]
struct RawDecision {
    #[serde(default)]
    update_type: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    narrative: Option<String>,
}

/// Decides how an existing note absorbs new content.
pub struct UpdateDecider<'a> {
    engine: &'a SynthesisEngine,
}

impl<'a> UpdateDecider<'a> {
    pub fn new(engine: &'a SynthesisEngine) -> Self {
        Self { engine }
    }

    /// Decide append vs. resynthesize and produce the resulting outcome.
    ///
    /// The returned narrative is always the complete note content: callers
    /// never concatenate themselves.
    #[instrument(skip_all, fields(history = note.inputs.len(), new_len = new_content.len()))]
    pub async fn decide(
        &self,
        note: ExistingNote<'_>,
        new_content: &str,
        ctx: &SynthesisContext,
    ) -> Result<(UpdateDecision, SynthesisOutcome)> {
        let metrics = HeuristicMetrics {
            new_words: new_content.split_whitespace().count(),
            existing_words: note.narrative_word_count(),
            history_len: note.inputs.len(),
        };

        // Phase 1: deterministic pre-checks
        if let Some(reason) = forced_resynthesis_reason(&metrics) {
            debug!(reason, "phase-1 heuristic forced resynthesis");
            let outcome = self.engine.resynthesize(note.inputs, ctx).await?;
            return Ok((
                UpdateDecision {
                    update_type: UpdateType::Resynthesize,
                    confidence: 1.0,
                    reason: reason.to_string(),
                },
                outcome,
            ));
        }

        // Phase 2: model-assisted (or its degraded stand-in)
        match self.engine.backend() {
            None => self.decide_degraded(note, new_content, &metrics, ctx).await,
            Some(backend) => {
                self.decide_with_model(backend.clone(), note, new_content, ctx)
                    .await
            }
        }
    }

    /// Degraded phase 2: simple word-count split, confidence 0.7 either way.
    async fn decide_degraded(
        &self,
        note: ExistingNote<'_>,
        new_content: &str,
        metrics: &HeuristicMetrics,
        ctx: &SynthesisContext,
    ) -> Result<(UpdateDecision, SynthesisOutcome)> {
        if metrics.new_words < DEGRADED_APPEND_WORDS {
            let narrative = join_nonempty(&[note.narrative, new_content]);
            let extraction = appended_extraction(note);

            return Ok((
                UpdateDecision {
                    update_type: UpdateType::Append,
                    confidence: 0.7,
                    reason: "small addition appended to existing note".to_string(),
                },
                SynthesisOutcome {
                    narrative,
                    extraction,
                },
            ));
        }

        let outcome = self.engine.resynthesize(note.inputs, ctx).await?;
        Ok((
            UpdateDecision {
                update_type: UpdateType::Resynthesize,
                confidence: 0.7,
                reason: "substantial new content resynthesized from full history".to_string(),
            },
            outcome,
        ))
    }

    /// Full phase 2: one bounded backend call; malformed output or a failed
    /// call falls back to a safe append.
    async fn decide_with_model(
        &self,
        backend: Arc<dyn CompletionBackend>,
        note: ExistingNote<'_>,
        new_content: &str,
        ctx: &SynthesisContext,
    ) -> Result<(UpdateDecision, SynthesisOutcome)> {
        let prompt = prompts::update_decision_prompt(
            note.title,
            note.narrative,
            note.summary,
            new_content,
            ctx,
        );

        let raw = match backend.complete(&prompt, self.engine.timeout()).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "decision call failed, safe append");
                return Ok(safe_append(note, new_content));
            }
        };

        let unfenced = normalizer::strip_code_fence(&raw);
        let decision_fields: RawDecision = match serde_json::from_str(unfenced) {
            Ok(fields) => fields,
            Err(_) => {
                warn!("unparseable decision response, safe append");
                return Ok(safe_append(note, new_content));
            }
        };

        let update_type = match decision_fields.update_type.as_deref() {
            Some("resynthesize") => UpdateType::Resynthesize,
            _ => UpdateType::Append,
        };
        let confidence = decision_fields.confidence.unwrap_or(0.5).clamp(0.0, 1.0);
        let reason = decision_fields
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "model-assisted update decision".to_string());

        // The narrative must be complete regardless of path; a missing or
        // blank one falls back to plain concatenation.
        let narrative = decision_fields
            .narrative
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| join_nonempty(&[note.narrative, new_content]));

        let extraction = normalizer::normalize(
            &raw,
            &FallbackContext::with_existing_title(new_content, note.title),
        );

        Ok((
            UpdateDecision {
                update_type,
                confidence,
                reason,
            },
            SynthesisOutcome {
                narrative,
                extraction,
            },
        ))
    }
}

/// First phase-1 heuristic that fires, if any.
fn forced_resynthesis_reason(metrics: &HeuristicMetrics) -> Option<&'static str> {
    PHASE_ONE_HEURISTICS
        .iter()
        .find(|(check, _)| check(metrics))
        .map(|(_, reason)| *reason)
}

/// Extraction for a fallback append: the note's current metadata, untouched.
///
/// An append without a usable model response must not re-title, re-file, or
/// re-tag the note based on the new fragment alone.
fn appended_extraction(note: ExistingNote<'_>) -> ExtractionResult {
    let mut extraction = ExtractionResult::empty(note.title);
    extraction.folder = note.folder.to_string();
    extraction.tags = note.tags.to_vec();
    extraction.summary = note.summary.map(str::to_string);
    extraction
}

/// The safe default for malformed or failed model decisions.
fn safe_append(note: ExistingNote<'_>, new_content: &str) -> (UpdateDecision, SynthesisOutcome) {
    let narrative = join_nonempty(&[note.narrative, new_content]);
    let extraction = appended_extraction(note);

    (
        UpdateDecision {
            update_type: UpdateType::Append,
            confidence: 0.5,
            reason: "model decision unavailable, appended new content".to_string(),
        },
        SynthesisOutcome {
            narrative,
            extraction,
        },
    )
}
