//! Note persistence.
//!
//! # Core Concepts
//!
//! - [`NoteStore`]: the storage contract every backend implements. Each
//!   operation is atomic with respect to other operations on the same store.
//! - [`FileStore`]: the production backend, one JSON file rewritten in full
//!   on every mutation.
//! - [`MemoryStore`]: a non-persistent backend with the same semantics.
//!
//! Failures are reported as [`StorageError`] so callers can branch on the
//! kind (`NotFound` vs. a broken backing file) without inspecting messages.

mod file;
mod memory;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Note, NoteInput};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors returned by note stores.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("note not found: {id}")]
    NotFound { id: String },

    #[error("store file {path} is corrupt: {source}")]
    CorruptStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode notes: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn not_found(id: &str) -> Self {
        StorageError::NotFound { id: id.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// The storage contract consumed by the HTTP layer.
///
/// Implementations must be safe to call from many threads at once.
pub trait NoteStore: Send + Sync {
    /// Returns every stored note.
    fn get_all(&self) -> StorageResult<Vec<Note>>;

    /// Returns the note whose id matches exactly.
    fn get_by_id(&self, id: &str) -> StorageResult<Note>;

    /// Stores a new note with a fresh id and the current time.
    fn create(&self, input: NoteInput) -> StorageResult<Note>;

    /// Replaces title and content of an existing note.
    fn update(&self, id: &str, input: NoteInput) -> StorageResult<Note>;

    /// Removes a note.
    fn delete(&self, id: &str) -> StorageResult<()>;
}

/// Shared handle used as router state.
pub type SharedStore = Arc<dyn NoteStore>;

/// Generates a collision-resistant note id.
pub(crate) fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// In-memory halves of the CRUD operations, shared by every backend.
pub(crate) mod ops {
    use chrono::Utc;

    use super::{generate_id, StorageError, StorageResult};
    use crate::models::{Note, NoteInput};

    pub fn find(notes: &[Note], id: &str) -> StorageResult<Note> {
        notes
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(id))
    }

    pub fn create(notes: &mut Vec<Note>, input: NoteInput) -> Note {
        let note = Note {
            id: generate_id(),
            title: input.title,
            content: input.content,
            created_at: Utc::now(),
        };
        notes.push(note.clone());
        note
    }

    pub fn update(notes: &mut [Note], id: &str, input: NoteInput) -> StorageResult<Note> {
        let note = notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| StorageError::not_found(id))?;
        note.apply(input);
        Ok(note.clone())
    }

    pub fn delete(notes: &mut Vec<Note>, id: &str) -> StorageResult<()> {
        let index = notes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| StorageError::not_found(id))?;
        notes.remove(index);
        Ok(())
    }
}
