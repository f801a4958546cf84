//! Whisper transcription.
//!
//! Shells out to a local whisper binary and parses its JSON output.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::config::ResolvedConfig;

/// Result of transcription
#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
    pub language: String,
    pub duration_seconds: f64,
}

/// Whisper output JSON structure
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    text: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    end: f64,
}

/// Transcribe an audio file with the configured whisper binary.
///
/// Hard failures propagate: a missing binary or unreadable audio file is an
/// operator problem, not something to paper over with an empty transcript.
pub async fn transcribe(audio_path: &Path, config: &ResolvedConfig) -> Result<Transcription> {
    debug!(path = %audio_path.display(), model = %config.whisper_model, "transcribing");

    // Whisper writes its JSON next to other formats; use a temp dir
    let temp_dir = tempfile::tempdir().context("Failed to create temp dir")?;

    let output = Command::new(&config.whisper_path)
        .arg(audio_path)
        .arg("--model")
        .arg(&config.whisper_model)
        .arg("--output_dir")
        .arg(temp_dir.path())
        .arg("--output_format")
        .arg("json")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .with_context(|| format!("Failed to run whisper at {}", config.whisper_path))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Whisper failed: {}", stderr);
    }

    let stem = audio_path.file_stem().unwrap_or_default().to_string_lossy();
    let json_path = temp_dir.path().join(format!("{}.json", stem));

    let json_content = tokio::fs::read_to_string(&json_path)
        .await
        .context("Failed to read whisper output")?;

    let whisper: WhisperOutput =
        serde_json::from_str(&json_content).context("Failed to parse whisper JSON")?;

    let duration = whisper.segments.last().map(|s| s.end).unwrap_or(0.0);

    Ok(Transcription {
        text: whisper.text.trim().to_string(),
        language: if whisper.language.is_empty() {
            "en".to_string()
        } else {
            whisper.language
        },
        duration_seconds: duration,
    })
}
