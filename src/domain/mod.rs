//! Domain types: inputs, extraction results, actions, notes.

pub mod action;
pub mod extraction;
pub mod input;
pub mod note;

pub use action::{Action, ActionDetails, ActionPriority, ActionStatus, ActionType};
pub use extraction::{
    CalendarDraft, EmailDraft, ExtractionResult, ReminderDraft, DEFAULT_FOLDERS, FALLBACK_FOLDER,
    MAX_TAGS,
};
pub use input::{InputKind, RawInput};
pub use note::{ExistingNote, NoteRecord};
