use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{ops, NoteStore, StorageResult};
use crate::models::{Note, NoteInput};

/// Non-persistent store with the same semantics as [`super::FileStore`].
#[derive(Default)]
pub struct MemoryStore {
    notes: Mutex<Vec<Note>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing notes, e.g. a fixture.
    pub fn with_notes(notes: Vec<Note>) -> Self {
        Self {
            notes: Mutex::new(notes),
        }
    }

    fn notes(&self) -> MutexGuard<'_, Vec<Note>> {
        // Every mutation either fully applies or returns before touching the
        // vector, so the contents are valid even after a panic elsewhere.
        self.notes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NoteStore for MemoryStore {
    fn get_all(&self) -> StorageResult<Vec<Note>> {
        Ok(self.notes().clone())
    }

    fn get_by_id(&self, id: &str) -> StorageResult<Note> {
        ops::find(&self.notes(), id)
    }

    fn create(&self, input: NoteInput) -> StorageResult<Note> {
        Ok(ops::create(&mut self.notes(), input))
    }

    fn update(&self, id: &str, input: NoteInput) -> StorageResult<Note> {
        ops::update(&mut self.notes(), id, input)
    }

    fn delete(&self, id: &str) -> StorageResult<()> {
        ops::delete(&mut self.notes(), id)
    }
}
