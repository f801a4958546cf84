//! Command-line interface for glide.
//!
//! Commands for capturing notes, appending to them, re-analyzing,
//! transcribing audio, and inspecting the note store.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::capture::CapturePipeline;
use crate::domain::NoteRecord;
use crate::ingest;
use crate::store::NoteStore;

/// glide - Voice memo capture and smart note synthesis
#[derive(Parser, Debug)]
#[command(name = "glide")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture a new note from text and/or audio
    Capture {
        /// Typed note text (reads from stdin if neither this nor --audio given)
        text: Option<String>,

        /// Audio file to transcribe and include
        #[arg(short, long)]
        audio: Option<PathBuf>,
    },

    /// Add content to an existing note
    Append {
        /// Note ID (UUID, prefix accepted)
        note_id: String,

        /// New text to add
        text: Option<String>,

        /// Audio file to transcribe and add
        #[arg(short, long)]
        audio: Option<PathBuf>,
    },

    /// Re-run extraction over a note's current narrative
    Analyze {
        /// Note ID (UUID, prefix accepted)
        note_id: String,
    },

    /// Transcribe an audio file and print the text
    Transcribe {
        /// Audio file path
        path: PathBuf,
    },

    /// List stored notes
    List {
        /// Maximum number of notes to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Filter by folder name
        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Show a note in full
    Show {
        /// Note ID (UUID, prefix accepted)
        note_id: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Capture { text, audio } => capture_note(text, audio).await,
            Commands::Append {
                note_id,
                text,
                audio,
            } => append_note(&note_id, text, audio).await,
            Commands::Analyze { note_id } => analyze_note(&note_id).await,
            Commands::Transcribe { path } => transcribe_audio(&path).await,
            Commands::List { limit, folder } => list_notes(limit, folder).await,
            Commands::Show { note_id } => show_note(&note_id).await,
            Commands::Config => show_config().await,
        }
    }
}

/// Capture a new note
async fn capture_note(text: Option<String>, audio: Option<PathBuf>) -> Result<()> {
    let text = match (text, &audio) {
        (Some(t), _) => Some(t),
        (None, Some(_)) => None,
        (None, None) => {
            // No arguments: read the note body from stdin
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            if buffer.trim().is_empty() {
                anyhow::bail!("No input provided. Pass text, --audio <file>, or pipe to stdin");
            }
            Some(buffer)
        }
    };

    let pipeline = CapturePipeline::from_config().await?;
    let note = pipeline.capture(text.as_deref(), audio.as_deref()).await?;

    print_note_summary(&note);
    eprintln!("\n[Note {} captured]", note.id);

    Ok(())
}

/// Append to an existing note
async fn append_note(note_id: &str, text: Option<String>, audio: Option<PathBuf>) -> Result<()> {
    let pipeline = CapturePipeline::from_config().await?;
    let id = resolve_note_id(pipeline.store(), note_id).await?;

    let (note, decision) = pipeline
        .append(id, text.as_deref(), audio.as_deref())
        .await?;

    print_note_summary(&note);
    eprintln!(
        "\n[Note {} updated: {} (confidence {:.2}) - {}]",
        note.id, decision.update_type, decision.confidence, decision.reason
    );

    Ok(())
}

/// Re-analyze a note
async fn analyze_note(note_id: &str) -> Result<()> {
    let pipeline = CapturePipeline::from_config().await?;
    let id = resolve_note_id(pipeline.store(), note_id).await?;

    let note = pipeline.analyze(id).await?;

    print_note_summary(&note);
    eprintln!("\n[Note {} re-analyzed]", note.id);

    Ok(())
}

/// Transcribe an audio file and print the result
async fn transcribe_audio(path: &PathBuf) -> Result<()> {
    let config = crate::config::config()?;
    let transcription = ingest::transcribe(path, config).await?;

    println!("{}", transcription.text);
    eprintln!(
        "\n[{:.1}s of audio, language: {}]",
        transcription.duration_seconds, transcription.language
    );

    Ok(())
}

/// List stored notes
async fn list_notes(limit: usize, folder: Option<String>) -> Result<()> {
    let store = NoteStore::open_default().await?;
    let notes = store.list().await?;

    let filtered: Vec<&NoteRecord> = notes
        .iter()
        .filter(|n| folder.as_deref().map_or(true, |f| n.folder == f))
        .collect();

    if filtered.is_empty() {
        println!("No notes found. Use 'glide capture' to create one.");
        return Ok(());
    }

    println!("{:<38} {:<12} {:<8} {:<40}", "ID", "FOLDER", "ACTIONS", "TITLE");
    println!("{}", "-".repeat(100));

    for note in filtered.iter().take(limit) {
        let title = if note.title.chars().count() > 37 {
            let truncated: String = note.title.chars().take(37).collect();
            format!("{}...", truncated)
        } else {
            note.title.clone()
        };
        println!(
            "{:<38} {:<12} {:<8} {:<40}",
            note.id,
            note.folder,
            note.actions.len(),
            title
        );
    }

    println!("\nTotal: {} note(s)", filtered.len());

    Ok(())
}

/// Show a note in full
async fn show_note(note_id: &str) -> Result<()> {
    let store = NoteStore::open_default().await?;
    let id = resolve_note_id(&store, note_id).await?;
    let note = store.load(id).await?;

    println!("ID:      {}", note.id);
    println!("Title:   {}", note.title);
    println!("Folder:  {}", note.folder);
    if !note.tags.is_empty() {
        println!("Tags:    {}", note.tags.join(", "));
    }
    if let Some(summary) = &note.summary {
        println!("Summary: {}", summary);
    }
    if note.duration_seconds > 0.0 {
        println!("Audio:   {:.1}s total", note.duration_seconds);
    }
    println!("Created: {}", note.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Updated: {}", note.updated_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Inputs:  {}", note.inputs.len());

    println!("\n{}", note.narrative);

    if !note.actions.is_empty() {
        println!("\nActions:");
        for action in &note.actions {
            let when = action
                .scheduled_date
                .map(|d| d.format(" @ %Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            println!(
                "  [{:?}] {:?}: {}{}",
                action.status, action.action_type, action.title, when
            );
        }
    }

    Ok(())
}

/// Show the resolved configuration (for debugging)
async fn show_config() -> Result<()> {
    let cfg = crate::config::config()?;

    println!("glide configuration");
    println!("{}", "=".repeat(60));
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:   {}", cfg.home.display());
    println!("  Notes:  {}", cfg.notes_dir().display());
    println!("  Audio:  {}", cfg.audio_dir().display());
    println!();
    println!("Extraction backend:");
    println!(
        "  Choice:        {}",
        cfg.backend.as_deref().unwrap_or("(auto from credentials)")
    );
    println!("  Anthropic key: {}", key_status(&cfg.anthropic_api_key));
    println!("  OpenAI key:    {}", key_status(&cfg.openai_api_key));
    println!("  Groq key:      {}", key_status(&cfg.groq_api_key));
    println!("  Timeout:       {}s", cfg.llm_timeout_secs);
    println!("  Timezone:      {}", cfg.timezone);
    println!();
    println!("Transcription:");
    println!("  Whisper path:  {}", cfg.whisper_path);
    println!("  Whisper model: {}", cfg.whisper_model);

    Ok(())
}

fn key_status(key: &Option<String>) -> &'static str {
    if key.is_some() {
        "set"
    } else {
        "not set"
    }
}

/// Resolve a full or prefix note id against the store
async fn resolve_note_id(store: &NoteStore, input: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }

    let notes = store.list().await?;
    let matches: Vec<&NoteRecord> = notes
        .iter()
        .filter(|n| n.id.to_string().starts_with(input))
        .collect();

    match matches.len() {
        0 => anyhow::bail!("No note matches id: {}", input),
        1 => Ok(matches[0].id),
        n => anyhow::bail!("Ambiguous note id '{}' matches {} notes", input, n),
    }
}

/// Print the short form of a note after a mutation
fn print_note_summary(note: &NoteRecord) {
    println!("Title:  {}", note.title);
    println!("Folder: {}", note.folder);
    if !note.tags.is_empty() {
        println!("Tags:   {}", note.tags.join(", "));
    }
    if let Some(summary) = &note.summary {
        println!("Summary: {}", summary);
    }
    if !note.actions.is_empty() {
        println!("Actions:");
        for action in &note.actions {
            println!("  {:?}: {}", action.action_type, action.title);
        }
    }
}
