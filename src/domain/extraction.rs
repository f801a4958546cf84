//! Typed extraction results and action drafts.
//!
//! An `ExtractionResult` is the normalized output of an extraction or
//! synthesis pass: note metadata (title, folder, tags, summary) plus ordered
//! lists of action drafts. Drafts are unpersisted payloads; the materializer
//! turns them into `Action` entities.

use serde::{Deserialize, Serialize};

/// Maximum number of tags retained on a result
pub const MAX_TAGS: usize = 5;

/// Folder used whenever no better hint is available
pub const FALLBACK_FOLDER: &str = "Personal";

/// Default folder name set offered to the extraction backend when the caller
/// supplies none
pub const DEFAULT_FOLDERS: [&str; 5] = ["Work", "Personal", "Ideas", "Meetings", "Projects"];

/// A calendar event draft extracted from free text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarDraft {
    pub title: String,

    /// ISO 8601 date (YYYY-MM-DD)
    pub date: String,

    /// 24-hour HH:MM, if mentioned
    #[serde(default)]
    pub time: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub attendees: Vec<String>,
}

/// An email draft extracted from free text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailDraft {
    /// Address or descriptive recipient name
    pub to: String,

    pub subject: String,

    pub body: String,
}

/// A reminder draft extracted from free text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderDraft {
    pub title: String,

    /// ISO 8601 date (YYYY-MM-DD)
    pub due_date: String,

    #[serde(default)]
    pub due_time: Option<String>,

    /// "low" | "medium" | "high"; anything else maps to medium
    #[serde(default = "default_priority")]
    pub priority: String,
}

fn default_priority() -> String {
    "medium".to_string()
}

/// Normalized output of an extraction/synthesis pass.
///
/// Every list field defaults to empty rather than being absent, and `tags`
/// is capped at [`MAX_TAGS`] by the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: String,

    /// Suggested folder name, from the caller-supplied or default set
    pub folder: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub calendar: Vec<CalendarDraft>,

    #[serde(default)]
    pub email: Vec<EmailDraft>,

    #[serde(default)]
    pub reminders: Vec<ReminderDraft>,
}

impl ExtractionResult {
    /// An empty result with the given title, filed under the fallback folder
    pub fn empty(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            folder: FALLBACK_FOLDER.to_string(),
            tags: Vec::new(),
            summary: None,
            calendar: Vec::new(),
            email: Vec::new(),
            reminders: Vec::new(),
        }
    }

    /// Total number of action drafts across all lists
    pub fn draft_count(&self) -> usize {
        self.calendar.len() + self.email.len() + self.reminders.len()
    }
}
