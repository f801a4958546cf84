//! Persisted action entities derived from extraction drafts.
//!
//! Actions are created once by the materializer and never mutated by the
//! core afterwards; status transitions belong to the external action
//! execution layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Calendar,
    Email,
    Reminder,
}

/// Lifecycle status. The core only ever produces `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Completed,
    Dismissed,
}

impl Default for ActionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Reminder priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPriority {
    Low,
    Medium,
    High,
}

impl ActionPriority {
    /// Map a free-form priority string to the typed enum.
    ///
    /// Unrecognized or absent values fall back to `Medium`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }
}

/// Provenance payload retained on every action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDetails {
    /// The original draft as extracted, before any parsing/mapping
    pub original: serde_json::Value,

    /// True when the action was materialized during an append flow
    #[serde(default)]
    pub from_append: bool,
}

/// A persisted, typed action tied to a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: Uuid,

    pub note_id: Uuid,

    pub action_type: ActionType,

    pub status: ActionStatus,

    pub title: String,

    /// Parsed event/due timestamp (calendar and reminder actions)
    pub scheduled_date: Option<DateTime<Utc>>,

    pub location: Option<String>,

    #[serde(default)]
    pub attendees: Vec<String>,

    pub email_to: Option<String>,

    pub email_subject: Option<String>,

    pub email_body: Option<String>,

    pub priority: Option<ActionPriority>,

    pub details: ActionDetails,

    pub created_at: DateTime<Utc>,
}

impl Action {
    /// Create a pending action of the given type with empty optional fields
    pub fn pending(
        note_id: Uuid,
        action_type: ActionType,
        title: impl Into<String>,
        details: ActionDetails,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            note_id,
            action_type,
            status: ActionStatus::Pending,
            title: title.into(),
            scheduled_date: None,
            location: None,
            attendees: Vec::new(),
            email_to: None,
            email_subject: None,
            email_body: None,
            priority: None,
            details,
            created_at: Utc::now(),
        }
    }
}
