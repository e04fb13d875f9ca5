//! In-memory blob store.

use std::collections::BTreeMap;

use super::BlobStore;
use crate::Result;

/// Blob store held in a map
///
/// Nothing survives the process; useful for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.blobs.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.blobs.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites() {
        let mut store = MemoryStore::new();
        store.set("users", "{}").unwrap();
        store.set("users", r#"{"a@b.c":{}}"#).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("users").unwrap().unwrap(), r#"{"a@b.c":{}}"#);
    }

    #[test]
    fn test_remove_absent_is_ok() {
        let mut store = MemoryStore::new();
        store.remove("missing").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_keys_sorted() {
        let mut store = MemoryStore::new();
        store.set("promocodes", "[]").unwrap();
        store.set("articles", "[]").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["articles", "promocodes"]);
    }
}
