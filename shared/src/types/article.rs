//! Persisted articles and the activity log vocabulary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ArticleId, FaqEntry, KeywordId, SiteId};

/// Publication status of an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    Draft,
    Ready,
    Published,
    Unpublished,
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Ready => "ready",
            ArticleStatus::Published => "published",
            ArticleStatus::Unpublished => "unpublished",
        };
        f.write_str(s)
    }
}

/// An article owned by exactly one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub site_id: SiteId,
    pub keyword_id: Option<KeywordId>,
    pub title: String,
    /// Unique within the owning site
    pub slug: String,
    pub body: String,
    pub summary: String,
    pub faq: Vec<FaqEntry>,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    pub status: ArticleStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload assembled by the generation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub body: String,
    pub summary: String,
    pub faq: Vec<FaqEntry>,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    pub status: ArticleStatus,
    pub published_at: Option<DateTime<Utc>>,
}

/// Activity log entry types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ArticleGenerated,
    ArticleDeleted,
    KeywordArchived,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActivityKind::ArticleGenerated => "article_generated",
            ActivityKind::ArticleDeleted => "article_deleted",
            ActivityKind::KeywordArchived => "keyword_archived",
        };
        f.write_str(s)
    }
}
