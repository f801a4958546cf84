//! Note synthesis: merging raw inputs into narratives and typed extractions.
//!
//! Three cooperating pieces:
//! - `normalizer`: defends against malformed model output
//! - `engine`: merges inputs into one narrative plus an extraction result
//! - `decider`: chooses append vs. resynthesize for existing notes

pub mod decider;
pub mod engine;
pub mod normalizer;
pub mod prompts;

use chrono::Utc;

pub use decider::{UpdateDecider, UpdateDecision, UpdateType};
pub use engine::{SynthesisEngine, SynthesisOutcome};
pub use normalizer::{FallbackContext, ParseOutcome};

/// Caller-supplied context threaded through every synthesis pass.
#[derive(Debug, Clone)]
pub struct SynthesisContext {
    /// User timezone, used by the backend for relative-date resolution
    pub timezone: String,

    /// Current date (YYYY-MM-DD) as seen by the user
    pub current_date: String,

    /// Valid folder names to bias folder selection; `None` uses the default set
    pub folders: Option<Vec<String>>,
}

impl Default for SynthesisContext {
    fn default() -> Self {
        Self {
            timezone: "America/Chicago".to_string(),
            current_date: Utc::now().format("%Y-%m-%d").to_string(),
            folders: None,
        }
    }
}

impl SynthesisContext {
    /// Context with a caller-supplied folder name list
    pub fn with_folders(folders: Vec<String>) -> Self {
        Self {
            folders: Some(folders),
            ..Default::default()
        }
    }
}
