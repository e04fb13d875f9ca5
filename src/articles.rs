//! Articles: buying guides and reviews

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::persistence::{BlobStore, keys, load_json, save_json};
use crate::{Error, Result, next_id, require};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: u32,
    pub title: String,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: String,
    pub created_at: NaiveDate,
}

impl Article {
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }
}

/// Editor input; `tags` is the raw comma-separated field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Split a comma-separated tag field, dropping blanks
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Articles {
    pub articles: Vec<Article>,
}

impl Articles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }

    pub fn add(&mut self, draft: ArticleDraft, default_image: &str, today: NaiveDate) -> Result<&Article> {
        let article = Article {
            id: next_id(self.articles.iter().map(|a| a.id)),
            title: require("title", &draft.title)?,
            content: require("content", &draft.content)?,
            author: require("author", &draft.author)?,
            tags: parse_tags(&draft.tags),
            image_url: image_or_default(draft.image_url, default_image),
            created_at: today,
        };
        log::info!("Article {} published: {}", article.id, article.title);
        self.articles.insert(0, article);
        Ok(&self.articles[0])
    }

    /// Edit an article in place; id and publication date are kept
    pub fn update(&mut self, id: u32, draft: ArticleDraft, default_image: &str) -> Result<&Article> {
        let title = require("title", &draft.title)?;
        let content = require("content", &draft.content)?;
        let author = require("author", &draft.author)?;

        let article = self
            .articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::not_found("Article", id))?;
        article.title = title;
        article.content = content;
        article.author = author;
        article.tags = parse_tags(&draft.tags);
        article.image_url = image_or_default(draft.image_url, default_image);
        Ok(&*article)
    }

    pub fn delete(&mut self, id: u32) -> Result<Article> {
        let pos = self
            .articles
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| Error::not_found("Article", id))?;
        Ok(self.articles.remove(pos))
    }

    pub fn with_tag(&self, tag: &str) -> Vec<&Article> {
        self.articles.iter().filter(|a| a.has_tag(tag)).collect()
    }

    pub fn load(store: &dyn BlobStore) -> Result<Option<Self>> {
        let articles: Option<Self> = load_json(store, keys::ARTICLES)?;
        if let Some(articles) = &articles {
            log::info!("Loaded {} articles", articles.len());
        }
        Ok(articles)
    }

    pub fn save(&self, store: &mut dyn BlobStore) -> Result<()> {
        save_json(store, keys::ARTICLES, self)
    }
}

fn image_or_default(image_url: Option<String>, default_image: &str) -> String {
    image_url
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default_image.to_string())
}

/// Shareable link to an article on the storefront page
pub fn share_url(origin: &str, id: u32) -> String {
    format!("{}/#article-{}", origin.trim_end_matches('/'), id)
}
