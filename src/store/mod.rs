//! File-based note persistence.
//!
//! Each note is stored as one pretty-printed JSON document under the notes
//! directory, named by note id. Flat files keep the store trivially
//! inspectable and debuggable.

use std::path::{Path, PathBuf};

use anyhow::Result;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use crate::domain::NoteRecord;

/// Errors that can occur in the note store
#[derive(Debug, Error)]
pub enum NoteStoreError {
    #[error("Note not found: {0}")]
    NotFound(Uuid),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// File-based note store, one JSON document per note
pub struct NoteStore {
    notes_dir: PathBuf,
}

impl NoteStore {
    /// Open a store rooted at the given directory, creating it if needed
    pub async fn open(notes_dir: impl Into<PathBuf>) -> Result<Self, NoteStoreError> {
        let notes_dir = notes_dir.into();
        fs::create_dir_all(&notes_dir).await?;

        Ok(Self { notes_dir })
    }

    /// Open the store at the configured notes directory
    pub async fn open_default() -> Result<Self> {
        let config = crate::config::config()?;
        Ok(Self::open(config.notes_dir()).await?)
    }

    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    fn note_path(&self, id: Uuid) -> PathBuf {
        self.notes_dir.join(format!("{}.json", id))
    }

    /// Write a note document, replacing any previous version
    pub async fn save(&self, note: &NoteRecord) -> Result<(), NoteStoreError> {
        let path = self.note_path(note.id);
        let json = serde_json::to_string_pretty(note)?;

        fs::write(&path, json).await?;

        Ok(())
    }

    /// Load a note by id
    pub async fn load(&self, id: Uuid) -> Result<NoteRecord, NoteStoreError> {
        let path = self.note_path(id);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(NoteStoreError::NotFound(id));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_str(&content)?)
    }

    /// List all stored notes, newest first
    pub async fn list(&self) -> Result<Vec<NoteRecord>, NoteStoreError> {
        let mut notes = Vec::new();

        if !self.notes_dir.exists() {
            return Ok(notes);
        }

        let mut entries = fs::read_dir(&self.notes_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let content = fs::read_to_string(&path).await?;
            let note: NoteRecord = serde_json::from_str(&content)?;
            notes.push(note);
        }

        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(notes)
    }

    /// Delete a note by id
    pub async fn delete(&self, id: Uuid) -> Result<(), NoteStoreError> {
        match fs::remove_file(&self.note_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(NoteStoreError::NotFound(id))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Content-addressed storage key for an audio file (first 16 hex chars of SHA256)
pub fn audio_storage_key(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    hex_encode(&result[..8])
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExtractionResult, RawInput};
    use tempfile::TempDir;

    async fn test_store() -> (NoteStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = NoteStore::open(temp.path().join("notes")).await.unwrap();
        (store, temp)
    }

    fn sample_note(narrative: &str) -> NoteRecord {
        let extraction = ExtractionResult::empty("Sample");
        NoteRecord::new(
            narrative.to_string(),
            &extraction,
            vec![RawInput::text(narrative.to_string())],
        )
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let (store, _temp) = test_store().await;

        let note = sample_note("Remember to call the vendor.");
        store.save(&note).await.unwrap();

        let loaded = store.load(note.id).await.unwrap();
        assert_eq!(loaded.id, note.id);
        assert_eq!(loaded.narrative, "Remember to call the vendor.");
        assert_eq!(loaded.inputs.len(), 1);
    }

    #[tokio::test]
    async fn test_save_replaces_previous_version() {
        let (store, _temp) = test_store().await;

        let mut note = sample_note("first");
        store.save(&note).await.unwrap();

        note.narrative = "second".to_string();
        store.save(&note).await.unwrap();

        let loaded = store.load(note.id).await.unwrap();
        assert_eq!(loaded.narrative, "second");

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_list_sorted_newest_first() {
        let (store, _temp) = test_store().await;

        let mut older = sample_note("older");
        older.updated_at = chrono::Utc::now() - chrono::Duration::hours(1);
        let newer = sample_note("newer");

        store.save(&older).await.unwrap();
        store.save(&newer).await.unwrap();

        let notes = store.list().await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].narrative, "newer");
        assert_eq!(notes[1].narrative, "older");
    }

    #[tokio::test]
    async fn test_load_missing_note_is_not_found() {
        let (store, _temp) = test_store().await;
        let id = Uuid::new_v4();

        match store.load(id).await {
            Err(NoteStoreError::NotFound(missing)) => assert_eq!(missing, id),
            other => panic!("expected NotFound, got {:?}", other.map(|n| n.id)),
        }
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _temp) = test_store().await;

        let note = sample_note("ephemeral");
        store.save(&note).await.unwrap();
        store.delete(note.id).await.unwrap();

        assert!(matches!(
            store.load(note.id).await,
            Err(NoteStoreError::NotFound(_))
        ));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[test]
    fn test_audio_storage_key_is_stable() {
        let key1 = audio_storage_key(b"audio bytes");
        let key2 = audio_storage_key(b"audio bytes");
        let key3 = audio_storage_key(b"other bytes");

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
        assert_eq!(key1.len(), 16);
    }
}
