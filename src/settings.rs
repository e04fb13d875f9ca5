//! Storefront settings
//!
//! Persisted in the blob store next to the content, under `settings`.

use serde::{Deserialize, Serialize};

use crate::comparison::DEFAULT_COMPARE_LIMIT;
use crate::persistence::{BlobStore, keys, load_json, save_json};
use crate::Result;

/// Minimum length for a user password
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 6;

/// Storefront configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Administrator ===
    /// Login of the built-in administrator
    pub admin_login: String,
    /// Password of the built-in administrator, compared as plain text
    pub admin_password: String,

    // === Accounts ===
    pub min_password_length: usize,

    // === Content ===
    /// How many products fit in the comparison table
    pub max_compare: usize,
    /// Image used when a product is added without one
    pub default_product_image: String,
    /// Image used when an article is published without one
    pub default_article_image: String,
    /// Write the demo catalog on first start
    pub seed_demo_content: bool,

    // === Links ===
    /// Public origin for share links
    pub site_origin: String,
    /// Prefix of uploaded image URLs
    pub cdn_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            admin_login: "admin".to_string(),
            admin_password: "changeme".to_string(),

            min_password_length: DEFAULT_MIN_PASSWORD_LEN,

            max_compare: DEFAULT_COMPARE_LIMIT,
            default_product_image:
                "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=400&h=400&fit=crop"
                    .to_string(),
            default_article_image:
                "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=800&h=400&fit=crop"
                    .to_string(),
            seed_demo_content: true,

            site_origin: "http://localhost:8080".to_string(),
            cdn_base_url: "https://cdn.example.com/shopsage".to_string(),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when absent or unreadable
    pub fn load(store: &dyn BlobStore) -> Result<Self> {
        match load_json(store, keys::SETTINGS)? {
            Some(settings) => {
                log::info!("Loaded settings from blob store");
                Ok(settings)
            }
            None => {
                log::info!("Using default settings");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, store: &mut dyn BlobStore) -> Result<()> {
        save_json(store, keys::SETTINGS, self)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Whether `login` names the built-in administrator
    pub fn is_builtin_admin(&self, login: &str) -> bool {
        login == self.admin_login
    }
}
