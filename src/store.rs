use crate::shared::fs_atomic::atomic_write_file;
use crate::shared::ids::validate_identifier_value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid store key: {0}")]
    InvalidKey(String),
    #[error("failed to create store directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read store value {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write store value {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to remove store value {path}: {source}")]
    Remove {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("store is read-only")]
    ReadOnly,
}

impl StoreError {
    /// True when the stored bytes were read but are not valid text.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(
            self,
            Self::Read { source, .. } if source.kind() == std::io::ErrorKind::InvalidData
        )
    }
}

/// String key to string value storage. A write is durable once `set`
/// returns `Ok`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key under a single directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(root).map_err(|source| StoreError::CreateDir {
            path: root.display().to_string(),
            source,
        })?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn value_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_identifier_value("store key", key).map_err(StoreError::InvalidKey)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.value_path(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.value_path(key)?;
        atomic_write_file(&path, value.as_bytes()).map_err(|source| StoreError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.value_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Remove {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let mut store = Self::default();
        store.values.insert(key.to_string(), value.to_string());
        store
    }

    /// Makes every subsequent `set`/`remove` fail with `StoreError::ReadOnly`.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FileStore, KeyValueStore, MemoryStore, StoreError};
    use tempfile::tempdir;

    #[test]
    fn file_store_round_trips_and_removes_values() {
        let dir = tempdir().expect("tempdir");
        let mut store = FileStore::open(&dir.path().join("store")).expect("open");
        assert_eq!(store.get("promptHistory").expect("get"), None);

        store.set("promptHistory", "[]").expect("set");
        assert_eq!(
            store.get("promptHistory").expect("get"),
            Some("[]".to_string())
        );
        assert!(dir.path().join("store/promptHistory.json").exists());

        store.remove("promptHistory").expect("remove");
        store.remove("promptHistory").expect("remove missing is ok");
        assert_eq!(store.get("promptHistory").expect("get"), None);
    }

    #[test]
    fn file_store_rejects_keys_that_escape_the_root() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::open(dir.path()).expect("open");
        let err = store.get("../outside").expect_err("invalid key");
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }

    #[test]
    fn file_store_reports_non_utf8_value_as_corrupt() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join("promptHistory.json"), [0xff, 0xfe, 0x00]).expect("write");
        let store = FileStore::open(dir.path()).expect("open");
        let err = store.get("promptHistory").expect_err("invalid utf-8");
        assert!(err.is_corrupt_data(), "{err}");
        assert!(!StoreError::ReadOnly.is_corrupt_data());
    }

    #[test]
    fn read_only_memory_store_fails_writes_but_still_reads() {
        let mut store = MemoryStore::with_value("k", "v");
        store.set_read_only(true);
        assert!(matches!(store.set("k", "w"), Err(StoreError::ReadOnly)));
        assert!(matches!(store.remove("k"), Err(StoreError::ReadOnly)));
        assert_eq!(store.get("k").expect("get"), Some("v".to_string()));
    }
}
