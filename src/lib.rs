//! glide - Voice memo capture and smart note synthesis
//!
//! Turns typed text and transcribed voice recordings into structured notes:
//! a coherent narrative, metadata (title, folder, tags, summary), and
//! actionable items (calendar events, emails, reminders) extracted along
//! the way.
//!
//! # Architecture
//!
//! Notes are history-first: every contribution is recorded as an immutable
//! raw input, and derived state (narrative, metadata) is recomputed from
//! that history rather than patched in place. When new content arrives for
//! an existing note, a decision engine chooses between appending and a full
//! resynthesis from the accumulated inputs.
//!
//! Every extraction path has a deterministic fallback: with no backend
//! configured (or a misbehaving one), capture still works, just with
//! mechanical titles and no action extraction.
//!
//! # Modules
//!
//! - `backends`: chat-completion providers behind one trait
//! - `synthesis`: normalizer, synthesis engine, and update decider
//! - `actions`: extraction drafts into persisted action entities
//! - `ingest`: whisper transcription
//! - `store`: file-based note persistence
//! - `capture`: end-to-end pipeline wiring it all together
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Capture a typed note
//! glide capture "team sync moved to thursday 2pm"
//!
//! # Capture from a recording
//! glide capture --audio memo.m4a
//!
//! # Add to an existing note
//! glide append <note-id> "also invite dana"
//! ```

pub mod actions;
pub mod backends;
pub mod capture;
pub mod cli;
pub mod config;
pub mod domain;
pub mod ingest;
pub mod store;
pub mod synthesis;

// Re-export main types at crate root for convenience
pub use capture::CapturePipeline;
pub use domain::{Action, ActionType, ExtractionResult, NoteRecord, RawInput};
pub use store::{NoteStore, NoteStoreError};
pub use synthesis::{SynthesisEngine, SynthesisOutcome, UpdateDecider, UpdateDecision, UpdateType};
