//! JSON-file backed note store with atomic replacement.

use std::fs::Permissions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tempfile::NamedTempFile;

use super::{ops, NoteStore, StorageError, StorageResult};
use crate::models::{Note, NoteInput};

/// Stores the whole note collection as a JSON array in one file.
///
/// Every operation runs a full load, modify, persist cycle while holding the
/// instance lock, so concurrent callers never interleave. Writes go to a
/// temporary file in the same directory which is then renamed over the target;
/// a reader never sees a partially written file.
///
/// The lock is in-process only. Two processes sharing one file are not
/// coordinated.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
    #[cfg(test)]
    fail_before_rename: std::sync::atomic::AtomicBool,
}

impl FileStore {
    /// Create a store backed by `path`. The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            #[cfg(test)]
            fail_before_rename: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guard protects no data of its own, so a panic in another
        // holder leaves nothing inconsistent behind.
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the collection. A missing or blank file is an empty collection.
    fn load(&self) -> StorageResult<Vec<Note>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "store file missing, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let notes: Vec<Note> =
            serde_json::from_slice(&bytes).map_err(|e| StorageError::CorruptStore {
                path: self.path.clone(),
                source: e,
            })?;
        tracing::debug!(path = %self.path.display(), count = notes.len(), "loaded notes");
        Ok(notes)
    }

    /// Replace the file contents with `notes`.
    fn persist(&self, notes: &[Note]) -> StorageResult<()> {
        let data =
            serde_json::to_vec_pretty(notes).map_err(|e| StorageError::Serialize { source: e })?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;

        let permissions = self.target_permissions()?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| self.io_error(e))?;
        if let Some(permissions) = permissions {
            temp.as_file()
                .set_permissions(permissions)
                .map_err(|e| self.io_error(e))?;
        }
        temp.write_all(&data).map_err(|e| self.io_error(e))?;
        temp.as_file().sync_all().map_err(|e| self.io_error(e))?;

        #[cfg(test)]
        if self
            .fail_before_rename
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(self.io_error(io::Error::other("rename refused")));
        }

        temp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        tracing::debug!(path = %self.path.display(), count = notes.len(), "persisted notes");
        Ok(())
    }

    /// Permissions the replacement file should carry: those of the current
    /// file, or 0644 for a new one. Temp files start out owner-only.
    fn target_permissions(&self) -> StorageResult<Option<Permissions>> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(meta.permissions())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(default_permissions()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Run one locked read-modify-write cycle. Nothing is written if `f` fails.
    fn mutate<T>(&self, f: impl FnOnce(&mut Vec<Note>) -> StorageResult<T>) -> StorageResult<T> {
        let _guard = self.lock();
        let mut notes = self.load()?;
        let out = f(&mut notes)?;
        self.persist(&notes)?;
        Ok(out)
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}

impl NoteStore for FileStore {
    fn get_all(&self) -> StorageResult<Vec<Note>> {
        let _guard = self.lock();
        self.load()
    }

    fn get_by_id(&self, id: &str) -> StorageResult<Note> {
        let _guard = self.lock();
        let notes = self.load()?;
        ops::find(&notes, id)
    }

    fn create(&self, input: NoteInput) -> StorageResult<Note> {
        self.mutate(|notes| Ok(ops::create(notes, input)))
    }

    fn update(&self, id: &str, input: NoteInput) -> StorageResult<Note> {
        self.mutate(|notes| ops::update(notes, id, input))
    }

    fn delete(&self, id: &str) -> StorageResult<()> {
        self.mutate(|notes| ops::delete(notes, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> FileStore {
        FileStore::new(dir.path().join("notes.json"))
    }

    #[test]
    fn missing_file_is_empty_and_not_created_by_reads() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.get_all().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn blank_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "  \n").unwrap();

        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn writes_pretty_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let note = store.create(NoteInput::new("T", "C")).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["id"], note.id.as_str());
        assert_eq!(value[0]["title"], "T");
        assert_eq!(value[0]["content"], "C");
        assert!(value[0]["createdAt"].is_string());
        assert!(raw.contains('\n'));
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("data").join("notes.json"));

        store.create(NoteInput::new("T", "C")).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn leaves_no_temporary_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let note = store.create(NoteInput::new("T", "C")).unwrap();
        store.update(&note.id, NoteInput::new("T2", "C2")).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("notes.json")]);
    }

    #[test]
    fn failed_mutation_does_not_touch_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.create(NoteInput::new("T", "C")).unwrap();
        let before = std::fs::read(store.path()).unwrap();

        assert!(store.delete("missing").unwrap_err().is_not_found());
        assert!(store
            .update("missing", NoteInput::new("X", "Y"))
            .unwrap_err()
            .is_not_found());

        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn failed_rename_keeps_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let note = store.create(NoteInput::new("T", "C")).unwrap();
        let before = std::fs::read(store.path()).unwrap();

        store
            .fail_before_rename
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let err = store.update(&note.id, NoteInput::new("T2", "C2")).unwrap_err();

        assert!(matches!(err, StorageError::Io { .. }));
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        store
            .fail_before_rename
            .store(false, std::sync::atomic::Ordering::SeqCst);
        assert_eq!(store.get_by_id(&note.id).unwrap(), note);
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_directory_keeps_previous_contents() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.create(NoteInput::new("T", "C")).unwrap();
        let before = std::fs::read(store.path()).unwrap();

        std::fs::set_permissions(dir.path(), Permissions::from_mode(0o555)).unwrap();
        // Privileged users ignore directory modes; nothing to check then.
        let check = dir.path().join("write-check");
        if std::fs::File::create(&check).is_ok() {
            std::fs::remove_file(&check).unwrap();
            std::fs::set_permissions(dir.path(), Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = store.create(NoteInput::new("T2", "C2"));
        std::fs::set_permissions(dir.path(), Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(StorageError::Io { .. })));
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_keeps_existing_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "[]").unwrap();
        std::fs::set_permissions(store.path(), Permissions::from_mode(0o640)).unwrap();

        let note = store.create(NoteInput::new("T", "C")).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);

        store.delete(&note.id).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn new_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.create(NoteInput::new("T", "C")).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn corrupt_file_is_reported_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{not json").unwrap();

        let err = store.create(NoteInput::new("T", "C")).unwrap_err();
        assert!(matches!(err, StorageError::CorruptStore { .. }));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{not json");
    }

    #[test]
    fn unreadable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be cannot be read as a file.
        let store = FileStore::new(dir.path());

        let err = store.get_all().unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
