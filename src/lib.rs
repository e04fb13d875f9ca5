//! ShopSage - a marketplace aggregator storefront
//!
//! Core modules:
//! - `persistence`: JSON blob store (memory, filesystem, LocalStorage)
//! - `catalog`, `comparison`, `posts`, `articles`, `promocodes`: content
//! - `auth`: plaintext credential check and the current session
//! - `engagement`, `analytics`: likes/comments and visit counters
//! - `fingerprint`: anonymous visitor identity
//! - `upload`: article image upload
//! - `storefront`: everything above over one store, with the admin guard
//! - `platform`: Browser/native platform abstraction

pub mod analytics;
pub mod articles;
pub mod auth;
pub mod catalog;
pub mod comparison;
pub mod engagement;
pub mod error;
pub mod fingerprint;
pub mod marketplace;
pub mod persistence;
pub mod platform;
pub mod posts;
pub mod promocodes;
pub mod seed;
pub mod settings;
pub mod storefront;
pub mod upload;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{AuthError, Error, Result, StorageError, UploadError};
pub use marketplace::{Marketplace, PromoScope};
pub use persistence::{BlobStore, MemoryStore};
pub use settings::Settings;
pub use storefront::Storefront;

/// Next id for a collection: one past the largest existing id, 1 when empty
#[inline]
pub fn next_id(ids: impl IntoIterator<Item = u32>) -> u32 {
    ids.into_iter().max().unwrap_or(0) + 1
}

/// Trimmed value of a required text field
pub(crate) fn require(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::missing(field));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_next_id_empty() {
        assert_eq!(next_id(Vec::<u32>::new()), 1);
    }

    #[test]
    fn test_next_id_ignores_gaps() {
        assert_eq!(next_id([3, 1, 7]), 8);
    }

    #[test]
    fn test_require_trims() {
        assert_eq!(require("title", "  Hi ").unwrap(), "Hi");
        assert!(matches!(require("title", "  "), Err(Error::Validation(_))));
    }

    proptest! {
        #[test]
        fn prop_next_id_is_fresh(ids in proptest::collection::vec(0u32..10_000, 0..50)) {
            let id = next_id(ids.iter().copied());
            prop_assert!(!ids.contains(&id));
            prop_assert!(id >= 1);
        }
    }
}
