//! Action materializer: extraction drafts into persisted action entities.
//!
//! Pure functions; the caller persists what comes back. Datetime parsing
//! never fails, preferring partial information over rejection.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::domain::action::{Action, ActionDetails, ActionPriority, ActionType};
use crate::domain::extraction::ExtractionResult;

/// Default time of day when a date arrives without one
const DEFAULT_TIME: &str = "09:00:00";

/// Materialize every draft in an extraction result into pending actions for
/// the given note.
///
/// `from_append` tags the provenance of each action's details payload so
/// append-originated actions stay distinguishable for later deduplication
/// and audit.
pub fn materialize(extraction: &ExtractionResult, note_id: Uuid, from_append: bool) -> Vec<Action> {
    let mut actions = Vec::with_capacity(extraction.draft_count());

    for draft in &extraction.calendar {
        let mut action = Action::pending(
            note_id,
            ActionType::Calendar,
            &draft.title,
            ActionDetails {
                original: json!(draft),
                from_append,
            },
        );
        action.scheduled_date = Some(parse_datetime(&draft.date, draft.time.as_deref()));
        action.location = draft.location.clone();
        action.attendees = draft.attendees.clone();
        actions.push(action);
    }

    for draft in &extraction.email {
        let mut action = Action::pending(
            note_id,
            ActionType::Email,
            format!("Email to {}", draft.to),
            ActionDetails {
                original: json!(draft),
                from_append,
            },
        );
        action.email_to = Some(draft.to.clone());
        action.email_subject = Some(draft.subject.clone());
        action.email_body = Some(draft.body.clone());
        actions.push(action);
    }

    for draft in &extraction.reminders {
        let mut action = Action::pending(
            note_id,
            ActionType::Reminder,
            &draft.title,
            ActionDetails {
                original: json!(draft),
                from_append,
            },
        );
        action.priority = Some(ActionPriority::from_str_lossy(&draft.priority));
        action.scheduled_date = Some(parse_datetime(&draft.due_date, draft.due_time.as_deref()));
        actions.push(action);
    }

    debug!(
        count = actions.len(),
        %note_id,
        from_append,
        "materialized actions"
    );

    actions
}

/// Parse a date string plus optional time into a timestamp.
///
/// Fallback chain: `date + "T" + time`, then `date + "T09:00:00"`, then the
/// date alone (midnight), then the current time. Never fails.
pub fn parse_datetime(date: &str, time: Option<&str>) -> DateTime<Utc> {
    if let Some(time) = time {
        if let Some(parsed) = parse_naive(&format!("{}T{}", date, time)) {
            return parsed.and_utc();
        }
    }

    if let Some(parsed) = parse_naive(&format!("{}T{}", date, DEFAULT_TIME)) {
        return parsed.and_utc();
    }

    if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        if let Some(midnight) = parsed.and_hms_opt(0, 0, 0) {
            return midnight.and_utc();
        }
    }

    Utc::now()
}

/// Parse an ISO-ish datetime, with or without seconds.
fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}
