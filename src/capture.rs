//! Capture pipeline: end-to-end flows from raw input to persisted note.
//!
//! Wires together transcription, synthesis, the update decider, action
//! materialization, and the note store. Each public method is one complete
//! user-facing operation.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::actions;
use crate::backends;
use crate::config::ResolvedConfig;
use crate::domain::{NoteRecord, RawInput};
use crate::ingest;
use crate::store::{self, NoteStore};
use crate::synthesis::{SynthesisContext, SynthesisEngine, SynthesisOutcome, UpdateDecider, UpdateDecision};

/// One complete capture stack: engine, store, and resolved configuration.
pub struct CapturePipeline {
    engine: SynthesisEngine,
    store: NoteStore,
    config: ResolvedConfig,
}

impl CapturePipeline {
    pub fn new(engine: SynthesisEngine, store: NoteStore, config: ResolvedConfig) -> Self {
        Self {
            engine,
            store,
            config,
        }
    }

    /// Build the pipeline from global configuration
    pub async fn from_config() -> Result<Self> {
        let config = crate::config::config()?.clone();
        let backend = backends::from_config(&config);
        let engine = SynthesisEngine::new(backend, config.llm_timeout());
        let store = NoteStore::open(config.notes_dir()).await?;

        Ok(Self::new(engine, store, config))
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    fn context(&self) -> SynthesisContext {
        SynthesisContext {
            timezone: self.config.timezone.clone(),
            ..SynthesisContext::default()
        }
    }

    /// Capture a new note from typed text and/or an audio recording.
    ///
    /// At least one channel should carry content; both empty still produces
    /// a valid (sentinel) note rather than an error.
    #[instrument(skip_all)]
    pub async fn capture(
        &self,
        text: Option<&str>,
        audio_path: Option<&Path>,
    ) -> Result<NoteRecord> {
        let mut inputs = Vec::new();
        let mut audio_transcript = String::new();

        if let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) {
            inputs.push(RawInput::text(text));
        }

        if let Some(path) = audio_path {
            let input = self.ingest_audio(path).await?;
            audio_transcript = input.content.clone();
            inputs.push(input);
        }

        let text_content = text.unwrap_or_default();
        let outcome = self
            .engine
            .synthesize(text_content, &audio_transcript, &self.context())
            .await?;

        let mut note = NoteRecord::new(outcome.narrative, &outcome.extraction, inputs);
        note.actions = actions::materialize(&outcome.extraction, note.id, false);

        self.store.save(&note).await?;
        info!(note_id = %note.id, title = %note.title, actions = note.actions.len(), "note captured");

        Ok(note)
    }

    /// Add new content to an existing note.
    ///
    /// The new input joins the note's history first; the decider then works
    /// over the updated history and returns the complete resulting narrative,
    /// so no concatenation happens here on the resynthesize path.
    #[instrument(skip_all, fields(%note_id))]
    pub async fn append(
        &self,
        note_id: Uuid,
        text: Option<&str>,
        audio_path: Option<&Path>,
    ) -> Result<(NoteRecord, UpdateDecision)> {
        let mut note = self.store.load(note_id).await?;

        let mut new_inputs = Vec::new();

        if let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) {
            new_inputs.push(RawInput::text(text));
        }

        if let Some(path) = audio_path {
            new_inputs.push(self.ingest_audio(path).await?);
        }

        if new_inputs.is_empty() {
            anyhow::bail!("Nothing to append: no text and no audio provided");
        }

        let new_content: String = new_inputs
            .iter()
            .map(|i| i.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let added_duration: f64 = new_inputs
            .iter()
            .filter_map(|i| i.audio_duration_seconds)
            .sum();

        note.inputs.extend(new_inputs);

        let decider = UpdateDecider::new(&self.engine);
        let (decision, outcome) = decider
            .decide(note.as_existing(), &new_content, &self.context())
            .await?;

        apply_outcome(&mut note, &outcome);
        note.duration_seconds += added_duration;
        note.updated_at = Utc::now();

        let new_actions = actions::materialize(&outcome.extraction, note.id, true);
        note.actions.extend(new_actions);

        self.store.save(&note).await?;
        info!(
            note_id = %note.id,
            update_type = %decision.update_type,
            confidence = decision.confidence,
            "note updated"
        );

        Ok((note, decision))
    }

    /// Re-run extraction over a stored note's current narrative.
    ///
    /// Refreshes metadata without touching the narrative, input history, or
    /// actions. Actions already materialized at capture/append time cover
    /// the same narrative; re-materializing here would duplicate them.
    #[instrument(skip_all, fields(%note_id))]
    pub async fn analyze(&self, note_id: Uuid) -> Result<NoteRecord> {
        let mut note = self.store.load(note_id).await?;

        let extraction = self.engine.analyze(&note.narrative, &self.context()).await?;

        note.title = extraction.title.clone();
        note.summary = extraction.summary.clone();
        note.tags = extraction.tags.clone();
        note.folder = extraction.folder.clone();
        note.updated_at = Utc::now();

        self.store.save(&note).await?;
        info!(note_id = %note.id, "note re-analyzed");

        Ok(note)
    }

    /// Transcribe, archive, and wrap an audio file as a raw input
    async fn ingest_audio(&self, path: &Path) -> Result<RawInput> {
        let transcription = ingest::transcribe(path, &self.config).await?;

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read audio file: {}", path.display()))?;
        let key = store::audio_storage_key(&bytes);

        let audio_dir = self.config.audio_dir();
        tokio::fs::create_dir_all(&audio_dir)
            .await
            .context("Failed to create audio directory")?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("m4a");
        let archived = audio_dir.join(format!("{}.{}", key, extension));
        tokio::fs::copy(path, &archived)
            .await
            .with_context(|| format!("Failed to archive audio to {}", archived.display()))?;

        Ok(
            RawInput::audio(transcription.text, transcription.duration_seconds)
                .with_storage_key(key),
        )
    }
}

/// Apply a synthesis outcome onto a note's derived fields
fn apply_outcome(note: &mut NoteRecord, outcome: &SynthesisOutcome) {
    note.narrative = outcome.narrative.clone();
    note.title = outcome.extraction.title.clone();
    note.summary = outcome.extraction.summary.clone();
    note.tags = outcome.extraction.tags.clone();
    note.folder = outcome.extraction.folder.clone();
}
