//! Blob store persistence
//!
//! Every content type lives under one fixed key as a JSON document that is
//! read in full and rewritten in full on every mutation.
//!
//! Backends:
//! - `MemoryStore`: in-process map, used by tests and ephemeral sessions
//! - `FileStore`: one `<key>.json` file per key (native only)
//! - `LocalStore`: browser LocalStorage (wasm32 only, see `platform`)

pub mod memory;
#[cfg(not(target_arch = "wasm32"))]
pub mod file;

pub use memory::MemoryStore;
#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

use serde::{Serialize, de::DeserializeOwned};

use crate::Result;

/// Fixed blob keys
pub mod keys {
    pub const PRODUCTS: &str = "products";
    pub const ARTICLES: &str = "articles";
    pub const PROMOCODES: &str = "promocodes";
    pub const COMPARISON_POSTS: &str = "comparison_posts";
    pub const COMPARISON: &str = "comparison";
    pub const USERS: &str = "users";
    pub const CURRENT_USER: &str = "currentUser";
    pub const VISITOR_ID: &str = "visitor_id";
    pub const SETTINGS: &str = "settings";
    pub const COMMENTS: &str = "comments";
    pub const LIKES: &str = "likes";
    pub const PAGE_VISITS: &str = "page_visits";
}

/// String-keyed store of serialized blobs
pub trait BlobStore {
    /// Read the blob under `key`, `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove(&mut self, key: &str) -> Result<()>;

    /// All keys currently present, sorted
    fn keys(&self) -> Result<Vec<String>>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<S: BlobStore + ?Sized> BlobStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

impl<S: BlobStore + ?Sized> BlobStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

/// Load and decode the blob under `key`.
///
/// A missing key yields `None`. A blob that no longer parses is logged and
/// treated as missing so callers fall back to their defaults.
pub fn load_json<T: DeserializeOwned>(store: &dyn BlobStore, key: &str) -> Result<Option<T>> {
    let Some(json) = store.get(key)? else {
        return Ok(None);
    };

    match serde_json::from_str(&json) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            log::warn!("Discarding corrupt blob '{}': {}", key, e);
            Ok(None)
        }
    }
}

/// Encode `value` and rewrite the blob under `key`
pub fn save_json<T: Serialize + ?Sized>(store: &mut dyn BlobStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}
