//! Browser LocalStorage blob store (wasm32 only).

use web_sys::Storage;

use crate::error::StorageError;
use crate::persistence::BlobStore;
use crate::Result;

/// Blob store backed by `window.localStorage`
pub struct LocalStore {
    storage: Storage,
}

impl LocalStore {
    /// Attach to the window's LocalStorage
    pub fn open() -> Result<Self> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| StorageError::Backend("LocalStorage unavailable".to_string()))?;
        Ok(Self { storage })
    }
}

fn js_err(op: &str, key: &str, e: wasm_bindgen::JsValue) -> StorageError {
    StorageError::Backend(format!("LocalStorage {op} '{key}' failed: {e:?}"))
}

impl BlobStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| js_err("get", key, e).into())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| js_err("set", key, e).into())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| js_err("remove", key, e).into())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let len = self
            .storage
            .length()
            .map_err(|e| js_err("length", "*", e))?;
        let mut keys = Vec::with_capacity(len as usize);
        for i in 0..len {
            if let Ok(Some(key)) = self.storage.key(i) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}
