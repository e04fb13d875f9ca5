//! Filesystem blob store (native only).

use std::fs;
use std::path::{Path, PathBuf};

use super::BlobStore;
use crate::error::StorageError;
use crate::Result;

const EXTENSION: &str = "json";

/// One `<key>.json` file per blob under a base directory
#[derive(Debug, Clone)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `base_path`, creating the directory if needed
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(StorageError::from)?;
        log::debug!("Blob store opened at {}", base_path.display());
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a key to its file path, rejecting anything that could escape
    /// the base directory
    fn key_to_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::Backend(format!("Invalid blob key '{key}'")).into());
        }
        Ok(self.base_path.join(format!("{key}.{EXTENSION}")))
    }
}

impl BlobStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_to_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Backend(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))
            .into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_to_path(key)?;
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));

        fs::write(&tmp, value).map_err(|e| {
            StorageError::Backend(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            StorageError::Backend(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.key_to_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e).into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.base_path).map_err(StorageError::from)? {
            let path = entry.map_err(StorageError::from)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path()).unwrap();

        store.set("products", "[]").unwrap();
        assert_eq!(store.get("products").unwrap().as_deref(), Some("[]"));
        assert!(temp_dir.path().join("products.json").exists());
        assert!(!temp_dir.path().join("products.json.tmp").exists());
    }

    #[test]
    fn test_get_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        assert!(store.get("articles").unwrap().is_none());
    }

    #[test]
    fn test_remove() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path()).unwrap();

        store.set("currentUser", "{}").unwrap();
        store.remove("currentUser").unwrap();
        assert!(store.get("currentUser").unwrap().is_none());
        // second remove is a no-op
        store.remove("currentUser").unwrap();
    }

    #[test]
    fn test_keys_lists_json_only() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path()).unwrap();

        store.set("users", "{}").unwrap();
        store.set("articles", "[]").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["articles", "users"]);
    }

    #[test]
    fn test_rejects_path_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path().join("nested")).unwrap();

        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("a/b").is_err());
        assert!(store.get("").is_err());
    }

    #[test]
    fn test_reopen_sees_data() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut store = FileStore::open(temp_dir.path()).unwrap();
            store.set("settings", r#"{"max_compare":4}"#).unwrap();
        }
        let store = FileStore::open(temp_dir.path()).unwrap();
        assert_eq!(
            store.get("settings").unwrap().as_deref(),
            Some(r#"{"max_compare":4}"#)
        );
    }
}
