//! Prompt construction for the extraction backend.
//!
//! The core owns every prompt; backends only see text in, text out. All
//! prompts demand bare JSON and the normalizer copes when the model ignores
//! that.

use crate::domain::extraction::DEFAULT_FOLDERS;

use super::SynthesisContext;

/// The JSON schema fragment shared by the synthesis and extraction prompts.
const ACTION_SCHEMA: &str = r#"  "tags": ["relevant", "tags", "max5"],
  "summary": "2-3 sentence summary of the key points",
  "calendar": [
    {
      "title": "Event name",
      "date": "YYYY-MM-DD",
      "time": "HH:MM (24hr, optional)",
      "location": "optional location",
      "attendees": ["optional", "attendees"]
    }
  ],
  "email": [
    {
      "to": "email@example.com or descriptive name",
      "subject": "Email subject line",
      "body": "Draft email body content"
    }
  ],
  "reminders": [
    {
      "title": "Reminder text",
      "due_date": "YYYY-MM-DD",
      "due_time": "HH:MM (optional)",
      "priority": "low|medium|high"
    }
  ]"#;

/// Render the folder choices as a pipe-separated list.
fn folder_choices(ctx: &SynthesisContext) -> String {
    match &ctx.folders {
        Some(folders) if !folders.is_empty() => folders.join("|"),
        _ => DEFAULT_FOLDERS.join("|"),
    }
}

/// Render the user context block (timezone, current date).
fn context_block(ctx: &SynthesisContext) -> String {
    format!(
        "User context:\n- Timezone: {}\n- Current date: {}",
        ctx.timezone, ctx.current_date
    )
}

/// Prompt for initial synthesis / full resynthesis.
///
/// Asks for a merged narrative in one voice plus the full extraction result.
pub fn synthesis_prompt(content: &str, ctx: &SynthesisContext) -> String {
    format!(
        r#"Merge this voice memo content into one coherent note and extract actionable items.

Content:
{content}

{context}

Extract and return ONLY valid JSON (no markdown, no explanation) with this exact structure:
{{
  "narrative": "The full note text, rewritten as one cohesive narrative in a single voice",
  "title": "Brief descriptive title for this note (5-10 words max)",
  "folder": "{folders}",
{schema}
}}

Rules:
1. The narrative must contain everything from the content, merged into one voice
2. Only include actions that are explicitly mentioned or strongly implied
3. Use realistic dates based on context (if "next Tuesday" is mentioned, calculate the actual date)
4. For emails, draft professional content based on the context
5. Categorize into the most appropriate folder
6. Extract 2-5 relevant tags
7. If no actions of a type are found, use empty array []
8. Return ONLY the JSON object, nothing else"#,
        content = content,
        context = context_block(ctx),
        folders = folder_choices(ctx),
        schema = ACTION_SCHEMA,
    )
}

/// Prompt for extraction over an existing transcript (no narrative rewrite).
pub fn extraction_prompt(transcript: &str, ctx: &SynthesisContext) -> String {
    format!(
        r#"Analyze this voice memo transcript and extract actionable items.

Transcript:
{transcript}

{context}

Extract and return ONLY valid JSON (no markdown, no explanation) with this exact structure:
{{
  "title": "Brief descriptive title for this note (5-10 words max)",
  "folder": "{folders}",
{schema}
}}

Rules:
1. Only include actions that are explicitly mentioned or strongly implied
2. Use realistic dates based on context
3. Categorize into the most appropriate folder
4. If no actions of a type are found, use empty array []
5. Return ONLY the JSON object, nothing else"#,
        transcript = transcript,
        context = context_block(ctx),
        folders = folder_choices(ctx),
        schema = ACTION_SCHEMA,
    )
}

/// Prompt for the model-assisted append/resynthesize decision.
///
/// The model must return both the decision and a complete updated result;
/// partial narratives are rejected by the decision criteria below.
pub fn update_decision_prompt(
    existing_title: &str,
    existing_narrative: &str,
    existing_summary: Option<&str>,
    new_content: &str,
    ctx: &SynthesisContext,
) -> String {
    format!(
        r#"You are updating an existing note with newly captured content and must decide how to merge it.

EXISTING NOTE TITLE: {title}

EXISTING NOTE SUMMARY: {summary}

EXISTING NOTE:
{narrative}

---

NEW CONTENT (just captured):
{new_content}

{context}

Decision criteria:
- "resynthesize" when the new content contradicts the existing note, shifts its topic, or changes its meaning
- "append" when the new content is purely additive

Return ONLY valid JSON (no markdown, no explanation) with this exact structure:
{{
  "update_type": "append|resynthesize",
  "confidence": 0.0,
  "reason": "One sentence explaining the decision",
  "narrative": "The COMPLETE updated note text (never a diff or fragment)",
  "title": "Updated title (keep the existing title unless the topic changed)",
  "folder": "{folders}",
{schema}
}}

Rules:
1. The narrative must always be the complete note content, with the new content already merged in
2. Only extract actions that are genuinely new; do not duplicate actions implied by the existing note
3. If no new actions are found, use empty arrays []
4. Return ONLY the JSON object, nothing else"#,
        title = existing_title,
        summary = existing_summary.unwrap_or("(none)"),
        narrative = existing_narrative,
        new_content = new_content,
        context = context_block(ctx),
        folders = folder_choices(ctx),
        schema = ACTION_SCHEMA,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_prompt_includes_content_and_folders() {
        let ctx = SynthesisContext::default();
        let prompt = synthesis_prompt("remember to email Sam", &ctx);

        assert!(prompt.contains("remember to email Sam"));
        assert!(prompt.contains("Work|Personal|Ideas|Meetings|Projects"));
        assert!(prompt.contains("\"narrative\""));
    }

    #[test]
    fn test_custom_folder_list_overrides_default() {
        let ctx = SynthesisContext {
            folders: Some(vec!["Inbox".to_string(), "Archive".to_string()]),
            ..Default::default()
        };
        let prompt = extraction_prompt("transcript", &ctx);

        assert!(prompt.contains("Inbox|Archive"));
        assert!(!prompt.contains("Work|Personal"));
    }

    #[test]
    fn test_decision_prompt_carries_both_sides() {
        let ctx = SynthesisContext::default();
        let prompt = update_decision_prompt(
            "Trip planning",
            "We leave on Friday.",
            Some("Travel plans"),
            "Actually we leave Saturday.",
            &ctx,
        );

        assert!(prompt.contains("Trip planning"));
        assert!(prompt.contains("We leave on Friday."));
        assert!(prompt.contains("Actually we leave Saturday."));
        assert!(prompt.contains("update_type"));
    }
}
