//! Audio ingestion.
//!
//! Turns recorded audio into text inputs for the capture pipeline:
//! local whisper transcription plus content-addressed audio storage.

pub mod transcriber;

pub use transcriber::{transcribe, Transcription};
