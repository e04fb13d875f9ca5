//! Product catalog
//!
//! Products are hand-curated links to marketplace listings. The whole list
//! is persisted under the `products` key.

use serde::{Deserialize, Serialize};

use crate::marketplace::Marketplace;
use crate::persistence::{BlobStore, keys, load_json, save_json};
use crate::{Error, Result, next_id, require};

/// A product listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u32,
    pub title: String,
    pub description: String,
    /// Display price as entered ("2 490 ₽"); never parsed
    pub price: String,
    pub marketplace: Marketplace,
    pub url: String,
    pub image_url: String,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Product {
    /// Case-insensitive substring match on title or description.
    /// An empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.title.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }
}

/// Fields an administrator fills in to create or edit a product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    pub price: String,
    pub marketplace: Marketplace,
    pub url: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Which products the catalog view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogTab {
    #[default]
    All,
    Favorites,
}

impl CatalogTab {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(CatalogTab::All),
            "favorites" | "favourites" => Some(CatalogTab::Favorites),
            _ => None,
        }
    }
}

/// The product list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    pub products: Vec<Product>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: u32) -> Result<&mut Product> {
        self.products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::not_found("Product", id))
    }

    /// Add a product at the front of the list
    pub fn add(&mut self, draft: ProductDraft, default_image: &str) -> Result<&Product> {
        let fields = validate(draft, default_image)?;
        let product = Product {
            id: next_id(self.products.iter().map(|p| p.id)),
            is_favorite: false,
            ..fields
        };
        log::info!("Product {} added: {}", product.id, product.title);
        self.products.insert(0, product);
        Ok(&self.products[0])
    }

    /// Replace the editable fields of a product, keeping id and favorite flag
    pub fn update(&mut self, id: u32, draft: ProductDraft, default_image: &str) -> Result<&Product> {
        let fields = validate(draft, default_image)?;
        let product = self.get_mut(id)?;
        *product = Product {
            id,
            is_favorite: product.is_favorite,
            ..fields
        };
        Ok(&*product)
    }

    pub fn delete(&mut self, id: u32) -> Result<Product> {
        let pos = self
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::not_found("Product", id))?;
        Ok(self.products.remove(pos))
    }

    /// Flip the favorite flag, returning the new state
    pub fn toggle_favorite(&mut self, id: u32) -> Result<bool> {
        let product = self.get_mut(id)?;
        product.is_favorite = !product.is_favorite;
        Ok(product.is_favorite)
    }

    pub fn favorites_count(&self) -> usize {
        self.products.iter().filter(|p| p.is_favorite).count()
    }

    /// Products matching `query` on the given tab, in list order
    pub fn search(&self, query: &str, tab: CatalogTab) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.matches(query))
            .filter(|p| tab == CatalogTab::All || p.is_favorite)
            .collect()
    }

    pub fn by_marketplace(&self, marketplace: Option<Marketplace>) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| marketplace.is_none_or(|m| p.marketplace == m))
            .collect()
    }

    /// Load the catalog, `None` if it has never been written
    pub fn load(store: &dyn BlobStore) -> Result<Option<Self>> {
        let catalog: Option<Self> = load_json(store, keys::PRODUCTS)?;
        if let Some(catalog) = &catalog {
            log::info!("Loaded {} products", catalog.len());
        }
        Ok(catalog)
    }

    pub fn save(&self, store: &mut dyn BlobStore) -> Result<()> {
        save_json(store, keys::PRODUCTS, self)?;
        log::debug!("Products saved ({} entries)", self.len());
        Ok(())
    }
}

/// Check required fields; the returned product still needs id and flag
fn validate(draft: ProductDraft, default_image: &str) -> Result<Product> {
    Ok(Product {
        id: 0,
        title: require("title", &draft.title)?,
        description: require("description", &draft.description)?,
        price: require("price", &draft.price)?,
        marketplace: draft.marketplace,
        url: require("url", &draft.url)?,
        image_url: draft
            .image_url
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default_image.to_string()),
        is_favorite: false,
    })
}
