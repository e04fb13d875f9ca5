//! Comparison posts
//!
//! Editorial write-ups that pit two or more marketplace offers against each
//! other with pros and cons. Persisted under `comparison_posts`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::marketplace::Marketplace;
use crate::persistence::{BlobStore, keys, load_json, save_json};
use crate::{Error, Result, next_id, require};

/// Smallest number of offers a post compares
pub const MIN_POST_PRODUCTS: usize = 2;

/// One offer inside a comparison post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostProduct {
    pub title: String,
    pub price: String,
    pub marketplace: Marketplace,
    pub url: String,
    pub pros: String,
    pub cons: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPost {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub products: Vec<PostProduct>,
    pub created_at: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub description: String,
    pub products: Vec<PostProduct>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Posts {
    pub posts: Vec<ComparisonPost>,
}

impl Posts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&ComparisonPost> {
        self.posts.iter().find(|p| p.id == id)
    }

    /// Publish a post dated `today` at the front of the list
    pub fn add(&mut self, draft: PostDraft, today: NaiveDate) -> Result<&ComparisonPost> {
        let title = require("title", &draft.title)?;
        let description = require("description", &draft.description)?;
        if draft.products.len() < MIN_POST_PRODUCTS {
            return Err(Error::Validation(format!(
                "a comparison needs at least {MIN_POST_PRODUCTS} products"
            )));
        }
        for (i, product) in draft.products.iter().take(MIN_POST_PRODUCTS).enumerate() {
            require(&format!("product {} title", i + 1), &product.title)?;
        }

        let post = ComparisonPost {
            id: next_id(self.posts.iter().map(|p| p.id)),
            title,
            description,
            products: draft.products,
            created_at: today,
        };
        log::info!("Comparison post {} published: {}", post.id, post.title);
        self.posts.insert(0, post);
        Ok(&self.posts[0])
    }

    pub fn delete(&mut self, id: u32) -> Result<ComparisonPost> {
        let pos = self
            .posts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::not_found("Comparison post", id))?;
        Ok(self.posts.remove(pos))
    }

    pub fn load(store: &dyn BlobStore) -> Result<Option<Self>> {
        let posts: Option<Self> = load_json(store, keys::COMPARISON_POSTS)?;
        if let Some(posts) = &posts {
            log::info!("Loaded {} comparison posts", posts.len());
        }
        Ok(posts)
    }

    pub fn save(&self, store: &mut dyn BlobStore) -> Result<()> {
        save_json(store, keys::COMPARISON_POSTS, self)
    }
}

/// Shareable link to a post on the storefront page
pub fn share_url(origin: &str, id: u32) -> String {
    format!("{}/#comparison-post-{}", origin.trim_end_matches('/'), id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 20).unwrap()
    }

    fn offer(title: &str, marketplace: Marketplace) -> PostProduct {
        PostProduct {
            title: title.to_string(),
            price: "2 190 ₽".to_string(),
            marketplace,
            url: marketplace.home_url().to_string(),
            pros: "Low latency".to_string(),
            cons: "Average bass".to_string(),
        }
    }

    fn draft() -> PostDraft {
        PostDraft {
            title: "Budget earbuds".to_string(),
            description: "Two popular TWS models".to_string(),
            products: vec![
                offer("Redmi Buds 4", Marketplace::Ozon),
                offer("Haylou GT7", Marketplace::Wildberries),
            ],
        }
    }

    #[test]
    fn test_add_dates_and_prepends() {
        let mut posts = Posts::new();
        posts.add(draft(), today()).unwrap();
        let second = posts.add(draft(), today()).unwrap();
        assert_eq!(second.id, 2);
        assert_eq!(second.created_at, today());
        assert_eq!(posts.posts[0].id, 2);
    }

    #[test]
    fn test_needs_two_titled_products() {
        let mut posts = Posts::new();

        let mut one = draft();
        one.products.truncate(1);
        assert!(matches!(posts.add(one, today()), Err(Error::Validation(_))));

        let mut untitled = draft();
        untitled.products[1].title = String::new();
        let err = posts.add(untitled, today()).unwrap_err();
        assert!(err.to_string().contains("product 2 title"));

        let mut no_title = draft();
        no_title.title = " ".to_string();
        assert!(posts.add(no_title, today()).is_err());
        assert!(posts.is_empty());
    }

    #[test]
    fn test_delete() {
        let mut posts = Posts::new();
        posts.add(draft(), today()).unwrap();
        assert_eq!(posts.delete(1).unwrap().title, "Budget earbuds");
        assert!(posts.delete(1).is_err());
    }

    #[test]
    fn test_created_at_serialized_as_date() {
        let mut posts = Posts::new();
        posts.add(draft(), today()).unwrap();
        let json = serde_json::to_string(&posts).unwrap();
        assert!(json.contains("\"createdAt\":\"2024-11-20\""));
    }

    #[test]
    fn test_share_url() {
        assert_eq!(
            share_url("https://shop.example/", 3),
            "https://shop.example/#comparison-post-3"
        );
    }
}
