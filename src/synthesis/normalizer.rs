//! Extraction normalizer: turns raw model output into a typed result.
//!
//! This is the availability guarantee against upstream model flakiness.
//! Whatever text a backend returns (fenced, truncated, not JSON at all),
//! normalization produces a usable `ExtractionResult` and never fails.

use chrono::Utc;
use serde::Deserialize;

use crate::domain::extraction::{
    CalendarDraft, EmailDraft, ExtractionResult, ReminderDraft, FALLBACK_FOLDER, MAX_TAGS,
};

/// Result of parsing a raw model response.
///
/// Consumers must handle both arms explicitly; there is no attribute-presence
/// guessing anywhere downstream.
#[derive(Debug)]
pub enum ParseOutcome {
    /// The response parsed as JSON; fields already defaulted and capped
    Parsed(ExtractionResult),

    /// The response was not valid JSON; carries the original text
    Malformed(String),
}

/// Context used to fill in degraded results.
#[derive(Debug, Clone, Copy)]
pub struct FallbackContext<'a> {
    /// The transcript/content the extraction was run over
    pub content: &'a str,

    /// The note's current title, when extracting for an append
    pub existing_title: Option<&'a str>,
}

impl<'a> FallbackContext<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            existing_title: None,
        }
    }

    pub fn with_existing_title(content: &'a str, title: &'a str) -> Self {
        Self {
            content,
            existing_title: Some(title),
        }
    }
}

/// Loose mirror of the JSON shape the prompts request. Everything is
/// optional; strictness lives in the draft types themselves.
#[derive(Debug, Default, Deserialize)]
struct RawExtraction {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    folder: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    calendar: Vec<CalendarDraft>,
    #[serde(default)]
    email: Vec<EmailDraft>,
    #[serde(default)]
    reminders: Vec<ReminderDraft>,
}

/// Strip a single enclosing fenced code block, optionally tagged "json".
///
/// Only one leading/trailing wrapper is removed; fences inside the body are
/// left alone.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);

    rest.trim()
}

/// Attempt a strict JSON parse of the (unfenced) response.
pub fn parse_response(raw: &str, fallback: &FallbackContext<'_>) -> ParseOutcome {
    let unfenced = strip_code_fence(raw);

    match serde_json::from_str::<RawExtraction>(unfenced) {
        Ok(parsed) => ParseOutcome::Parsed(finalize(parsed, fallback)),
        Err(_) => ParseOutcome::Malformed(raw.to_string()),
    }
}

/// Normalize a raw model response into an `ExtractionResult`.
///
/// Never fails: malformed input degrades to a result carrying the existing
/// title (append mode) or a synthesized one, a clipped summary of the source
/// content, and empty action lists.
pub fn normalize(raw: &str, fallback: &FallbackContext<'_>) -> ExtractionResult {
    match parse_response(raw, fallback) {
        ParseOutcome::Parsed(result) => result,
        ParseOutcome::Malformed(_) => degraded_result(fallback),
    }
}

/// Apply field defaults and the tag cap to a successfully parsed response.
fn finalize(raw: RawExtraction, fallback: &FallbackContext<'_>) -> ExtractionResult {
    let title = raw
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| synthesize_title(fallback.content));

    let folder = raw
        .folder
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_FOLDER.to_string());

    let mut tags = raw.tags;
    tags.truncate(MAX_TAGS);

    ExtractionResult {
        title,
        folder,
        tags,
        summary: raw.summary,
        calendar: raw.calendar,
        email: raw.email,
        reminders: raw.reminders,
    }
}

/// The degraded result for a response that could not be parsed.
fn degraded_result(fallback: &FallbackContext<'_>) -> ExtractionResult {
    let title = match fallback.existing_title {
        Some(existing) => existing.to_string(),
        None => synthesize_title(fallback.content),
    };

    let mut result = ExtractionResult::empty(title);
    if !fallback.content.trim().is_empty() {
        result.summary = Some(clip_summary(fallback.content));
    }
    result
}

/// Deterministic extraction used when no backend is configured or reachable.
pub fn degraded_extraction(content: &str) -> ExtractionResult {
    let mut result = ExtractionResult::empty(synthesize_title(content));
    if !content.trim().is_empty() {
        result.summary = Some(clip_summary(content));
    }
    result
}

/// Derive a title from the first ten words of the content.
///
/// Blank content gets a timestamped placeholder instead.
pub fn synthesize_title(content: &str) -> String {
    let words: Vec<&str> = content.split_whitespace().collect();

    if words.is_empty() {
        return format!("Voice Note - {}", Utc::now().format("%b %d, %Y %I:%M %p"));
    }

    let title = words.iter().take(10).copied().collect::<Vec<_>>().join(" ");
    if words.len() > 10 {
        format!("{}...", title)
    } else {
        title
    }
}

/// Clip content to a 200-character prefix, ellipsis-suffixed when truncated.
pub fn clip_summary(content: &str) -> String {
    if content.chars().count() > 200 {
        let prefix: String = content.chars().take(200).collect();
        format!("{}...", prefix)
    } else {
        content.to_string()
    }
}
