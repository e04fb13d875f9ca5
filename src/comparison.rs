//! Side-by-side product comparison
//!
//! A visitor picks up to `limit` products from the catalog. The selection
//! holds snapshots, so a product later edited or deleted in the catalog
//! stays as it was when it was picked.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::persistence::{BlobStore, keys, load_json, save_json};
use crate::{Error, Result};

/// Default number of products that fit side by side
pub const DEFAULT_COMPARE_LIMIT: usize = 4;

/// One attribute across all compared products
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRow {
    pub label: &'static str,
    pub values: Vec<String>,
}

/// Current comparison selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub selected: Vec<Product>,
    #[serde(skip, default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_COMPARE_LIMIT
}

impl Default for Comparison {
    fn default() -> Self {
        Self::with_limit(DEFAULT_COMPARE_LIMIT)
    }
}

impl Comparison {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            selected: Vec::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.selected.truncate(limit);
    }

    pub fn is_full(&self) -> bool {
        self.selected.len() >= self.limit
    }

    pub fn contains(&self, id: u32) -> bool {
        self.selected.iter().any(|p| p.id == id)
    }

    pub fn add(&mut self, product: Product) -> Result<()> {
        if self.contains(product.id) {
            return Err(Error::Validation(format!(
                "product {} is already being compared",
                product.id
            )));
        }
        if self.is_full() {
            return Err(Error::Validation(format!(
                "at most {} products can be compared",
                self.limit
            )));
        }
        self.selected.push(product);
        Ok(())
    }

    pub fn remove(&mut self, id: u32) -> Result<Product> {
        let pos = self
            .selected
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::not_found("Compared product", id))?;
        Ok(self.selected.remove(pos))
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Catalog products that could still be added and match `query`
    pub fn available<'a>(&self, catalog: &'a [Product], query: &str) -> Vec<&'a Product> {
        catalog
            .iter()
            .filter(|p| !self.contains(p.id) && p.matches(query))
            .collect()
    }

    /// Comparison table, one value column per selected product
    pub fn rows(&self) -> Vec<ComparisonRow> {
        let column = |f: fn(&Product) -> String| -> Vec<String> { self.selected.iter().map(f).collect() };
        vec![
            ComparisonRow {
                label: "Title",
                values: column(|p| p.title.clone()),
            },
            ComparisonRow {
                label: "Price",
                values: column(|p| p.price.clone()),
            },
            ComparisonRow {
                label: "Marketplace",
                values: column(|p| p.marketplace.display_name().to_string()),
            },
            ComparisonRow {
                label: "Description",
                values: column(|p| p.description.clone()),
            },
            ComparisonRow {
                label: "Link",
                values: column(|p| p.url.clone()),
            },
        ]
    }

    pub fn load(store: &dyn BlobStore, limit: usize) -> Result<Self> {
        let mut comparison: Self = load_json(store, keys::COMPARISON)?.unwrap_or_default();
        comparison.set_limit(limit);
        Ok(comparison)
    }

    pub fn save(&self, store: &mut dyn BlobStore) -> Result<()> {
        save_json(store, keys::COMPARISON, self)
    }
}
