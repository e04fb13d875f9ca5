//! Likes and comments on articles
//!
//! Visitors are anonymous: a like is keyed by `(article_id, fingerprint)`,
//! and a comment keeps the fingerprint of whoever wrote it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persistence::{BlobStore, keys, load_json, save_json};
use crate::{Error, Result};

/// Author name used when a comment is posted without one
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeSummary {
    pub total_likes: usize,
    pub user_liked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u32,
    pub article_id: u32,
    pub author_name: String,
    #[serde(default)]
    pub author_email: Option<String>,
    pub content: String,
    #[serde(default)]
    pub visitor_fingerprint: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub article_id: u32,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: Option<String>,
    pub content: String,
    #[serde(default)]
    pub visitor_fingerprint: String,
}

/// Likes and comments service
pub trait Engagement {
    /// Record a like; `false` when this visitor already liked the article
    fn like(&mut self, article_id: u32, fingerprint: &str) -> Result<bool>;

    fn unlike(&mut self, article_id: u32, fingerprint: &str) -> Result<()>;

    /// Like count, and whether `fingerprint` is among the likers
    fn likes(&self, article_id: u32, fingerprint: Option<&str>) -> Result<LikeSummary>;

    /// Comments on an article, newest first
    fn comments(&self, article_id: u32) -> Result<Vec<Comment>>;

    fn add_comment(&mut self, comment: NewComment, now: DateTime<Utc>) -> Result<Comment>;

    fn delete_comment(&mut self, id: u32) -> Result<Comment>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Like {
    article_id: u32,
    visitor_fingerprint: String,
}

/// Comments plus the id sequence, so deleted ids are never handed out again
#[derive(Debug, Default, Serialize, Deserialize)]
struct CommentLog {
    #[serde(default)]
    last_id: u32,
    #[serde(default)]
    comments: Vec<Comment>,
}

/// `Engagement` over the `likes` and `comments` blobs
pub struct BlobEngagement<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> BlobEngagement<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn load_likes(&self) -> Result<Vec<Like>> {
        Ok(load_json(&self.store, keys::LIKES)?.unwrap_or_default())
    }

    fn load_comments(&self) -> Result<CommentLog> {
        Ok(load_json(&self.store, keys::COMMENTS)?.unwrap_or_default())
    }
}

fn check_like(article_id: u32, fingerprint: &str) -> Result<()> {
    if article_id == 0 || fingerprint.is_empty() {
        return Err(Error::Validation(
            "article_id and visitor_fingerprint are required".to_string(),
        ));
    }
    Ok(())
}

impl<S: BlobStore> Engagement for BlobEngagement<S> {
    fn like(&mut self, article_id: u32, fingerprint: &str) -> Result<bool> {
        check_like(article_id, fingerprint)?;
        let mut likes = self.load_likes()?;
        if likes
            .iter()
            .any(|l| l.article_id == article_id && l.visitor_fingerprint == fingerprint)
        {
            return Ok(false);
        }

        likes.push(Like {
            article_id,
            visitor_fingerprint: fingerprint.to_string(),
        });
        save_json(&mut self.store, keys::LIKES, &likes)?;
        log::debug!("Article {} liked by {}", article_id, fingerprint);
        Ok(true)
    }

    fn unlike(&mut self, article_id: u32, fingerprint: &str) -> Result<()> {
        check_like(article_id, fingerprint)?;
        let mut likes = self.load_likes()?;
        let before = likes.len();
        likes.retain(|l| !(l.article_id == article_id && l.visitor_fingerprint == fingerprint));
        if likes.len() != before {
            save_json(&mut self.store, keys::LIKES, &likes)?;
        }
        Ok(())
    }

    fn likes(&self, article_id: u32, fingerprint: Option<&str>) -> Result<LikeSummary> {
        if article_id == 0 {
            return Err(Error::missing("article_id"));
        }
        let likes = self.load_likes()?;
        let mut summary = LikeSummary {
            total_likes: 0,
            user_liked: false,
        };
        for like in likes.iter().filter(|l| l.article_id == article_id) {
            summary.total_likes += 1;
            if fingerprint.is_some_and(|fp| !fp.is_empty() && fp == like.visitor_fingerprint) {
                summary.user_liked = true;
            }
        }
        Ok(summary)
    }

    fn comments(&self, article_id: u32) -> Result<Vec<Comment>> {
        if article_id == 0 {
            return Err(Error::missing("article_id"));
        }
        let mut comments: Vec<Comment> = self
            .load_comments()?
            .comments
            .into_iter()
            .filter(|c| c.article_id == article_id)
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(comments)
    }

    fn add_comment(&mut self, comment: NewComment, now: DateTime<Utc>) -> Result<Comment> {
        let content = comment.content.trim();
        if comment.article_id == 0 || content.is_empty() {
            return Err(Error::Validation("article_id and content are required".to_string()));
        }
        let author_name = match comment.author_name.trim() {
            "" => ANONYMOUS_AUTHOR.to_string(),
            name => name.to_string(),
        };

        let mut thread = self.load_comments()?;
        thread.last_id = thread
            .last_id
            .max(thread.comments.iter().map(|c| c.id).max().unwrap_or(0))
            + 1;
        let comment = Comment {
            id: thread.last_id,
            article_id: comment.article_id,
            author_name,
            author_email: comment
                .author_email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            content: content.to_string(),
            visitor_fingerprint: comment.visitor_fingerprint,
            created_at: now,
        };
        thread.comments.push(comment.clone());
        save_json(&mut self.store, keys::COMMENTS, &thread)?;

        log::info!("Comment {} added to article {}", comment.id, comment.article_id);
        Ok(comment)
    }

    fn delete_comment(&mut self, id: u32) -> Result<Comment> {
        let mut thread = self.load_comments()?;
        let pos = thread
            .comments
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| Error::not_found("Comment", id))?;
        let removed = thread.comments.remove(pos);
        save_json(&mut self.store, keys::COMMENTS, &thread)?;

        log::info!("Comment {} deleted", id);
        Ok(removed)
    }
}
