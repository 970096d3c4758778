//! # File-Backed Key-Value Store
//!
//! Keeps each slot in its own file under a data directory.
//!
//! ```text
//! <data-dir>/
//!   chat_storage_u1.slot
//!   chat_storage_u1_salt.slot
//!   chat_key_anonymous.slot
//! ```
//!
//! Writes go to `<name>.slot.tmp` first and are renamed into place, so a
//! crash mid-write leaves the previous value readable.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::KeyValueStore;
use crate::error::{Error, Result};

const SLOT_EXTENSION: &str = "slot";

/// Directory-backed key-value store
pub struct FileStore {
    dir: PathBuf,
    /// Serializes writers within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            Error::StorageUnavailable(format!("cannot create {}: {}", dir.display(), e))
        })?;

        tracing::debug!(dir = %dir.display(), "Opened file store");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Root directory of the store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", encode_file_name(key), SLOT_EXTENSION))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::StorageUnavailable(format!("read {}: {}", key, e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        let path = self.slot_path(key);
        let tmp_path = path.with_extension(format!("{}.tmp", SLOT_EXTENSION));

        if let Err(e) = fs::write(&tmp_path, value) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::StorageUnavailable(format!("write {}: {}", key, e)));
        }

        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::StorageUnavailable(format!("rename {}: {}", key, e)));
        }

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let _guard = self.write_lock.lock();
        match fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::StorageUnavailable(format!("remove {}: {}", key, e))),
        }
    }
}

/// Map a slot key to a safe file name
///
/// `[A-Za-z0-9_-]` pass through, everything else becomes `%XX` per byte.
fn encode_file_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' => out.push(byte as char),
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        assert!(store.get("chat_key_u1").unwrap().is_none());

        store.set("chat_key_u1", "a2V5").unwrap();
        assert_eq!(store.get("chat_key_u1").unwrap().as_deref(), Some("a2V5"));
        assert!(dir.path().join("chat_key_u1.slot").exists());

        assert!(store.remove("chat_key_u1").unwrap());
        assert!(!store.remove("chat_key_u1").unwrap());
        assert!(store.get("chat_key_u1").unwrap().is_none());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = FileStore::new(dir.path()).unwrap();
            store.set("chat_storage_u1", r#"{"mode":"key"}"#).unwrap();
        }

        let reopened = FileStore::new(dir.path()).unwrap();
        assert_eq!(
            reopened.get("chat_storage_u1").unwrap().as_deref(),
            Some(r#"{"mode":"key"}"#)
        );
    }

    #[test]
    fn test_no_temp_files_left() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.slot".to_string()]);
    }

    #[test]
    fn test_creates_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("bookingai").join("history");

        let store = FileStore::new(&nested).unwrap();
        store.set("k", "v").unwrap();

        assert!(nested.is_dir());
    }

    #[test]
    fn test_encode_file_name() {
        assert_eq!(encode_file_name("chat_key_u1"), "chat_key_u1");
        assert_eq!(encode_file_name("chat_key_a/b"), "chat_key_a%2Fb");
        assert_eq!(encode_file_name("../x"), "%2E%2E%2Fx");
        assert_ne!(encode_file_name("a%2F"), encode_file_name("a/"));
    }
}
