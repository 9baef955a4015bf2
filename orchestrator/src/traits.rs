//! Trait definitions with mockall annotations for testing
//!
//! The orchestrator only talks to the outside world through these traits: the
//! content/improvement/image generation services, the row store and the clock.
//! Real implementations live in `services`; tests use the generated mocks.

use chrono::{DateTime, Utc};
use shared::{
    ActivityKind, Article, ArticleId, GeneratedDraft, ImageAsset, ImprovementOptions, Keyword, KeywordId,
    KeywordStatus, NewArticle, NewKeyword, Site, SiteId,
};

use crate::error::OrchestratorResult;

/// Article generation service
///
/// Failures surface as `OrchestratorError::Generation` and are fatal to a
/// single pipeline attempt.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate a full draft for a keyword
    ///
    /// # Parameters
    /// - `keyword`: Keyword text to write about
    /// - `style_hint`: Optional cluster or tone hint
    async fn generate(&self, keyword: &str, style_hint: Option<String>) -> OrchestratorResult<GeneratedDraft>;
}

/// Best-effort improvement pass over a generated draft
#[mockall::automock]
#[async_trait::async_trait]
pub trait ContentImprover: Send + Sync {
    /// Return an improved copy of `draft`
    async fn improve(&self, draft: &GeneratedDraft, options: &ImprovementOptions) -> OrchestratorResult<GeneratedDraft>;
}

/// Best-effort featured image generation
#[mockall::automock]
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image for a prompt
    ///
    /// # Returns
    /// `Ok(None)` when the service produced nothing usable
    async fn generate(&self, prompt: &str, model: &str, site_id: &SiteId) -> OrchestratorResult<Option<ImageAsset>>;
}

/// Row-level store for sites, keywords, articles and the activity log
///
/// No transaction spans the remote generation calls. The only atomicity the
/// orchestrator relies on is `claim_keyword`, which must be a conditional
/// `pending -> generating` update so that concurrent claimers cannot both win.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Look up a site with its cadence configuration
    async fn get_site(&self, site_id: &SiteId) -> OrchestratorResult<Option<Site>>;

    /// Fetch keywords in the order of `ids`, skipping unknown ids
    async fn get_keywords(&self, ids: &[KeywordId]) -> OrchestratorResult<Vec<Keyword>>;

    /// Count articles created for a site at or after `since`
    async fn count_articles_since(&self, site_id: &SiteId, since: DateTime<Utc>) -> OrchestratorResult<u32>;

    /// Atomically move a keyword from `pending` to `generating`
    ///
    /// # Returns
    /// `false` if the keyword is unknown, already claimed or not pending
    async fn claim_keyword(&self, keyword_id: &KeywordId) -> OrchestratorResult<bool>;

    /// Revert a keyword to `pending`
    async fn release_keyword(&self, keyword_id: &KeywordId) -> OrchestratorResult<()>;

    /// Resolve a claim to `generated` or `published`
    async fn mark_keyword_generated(&self, keyword_id: &KeywordId, status: KeywordStatus) -> OrchestratorResult<()>;

    /// Persist a new article
    async fn insert_article(
        &self,
        site_id: &SiteId,
        keyword_id: Option<KeywordId>,
        payload: NewArticle,
    ) -> OrchestratorResult<Article>;

    /// Remove an article, returning it if it existed
    async fn delete_article(&self, article_id: &ArticleId) -> OrchestratorResult<Option<Article>>;

    /// Move a keyword to `archived`
    ///
    /// # Returns
    /// `false` if the keyword is unknown or currently claimed
    async fn archive_keyword(&self, keyword_id: &KeywordId) -> OrchestratorResult<bool>;

    /// Import keywords as `pending`; `site_id == None` adds them to the global pool
    async fn add_keywords(&self, site_id: Option<SiteId>, entries: Vec<NewKeyword>) -> OrchestratorResult<Vec<Keyword>>;

    /// Append to the activity log
    async fn log_activity(
        &self,
        site_id: &SiteId,
        kind: ActivityKind,
        message: &str,
        metadata: serde_json::Value,
    ) -> OrchestratorResult<()>;
}

/// Source of the current instant
#[mockall::automock]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
