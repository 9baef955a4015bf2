//! In-memory store implementation
//!
//! Mutex-guarded tables for sites, keywords, articles and the activity log.
//! Used by the binary for local runs and by the integration tests. The claim is
//! a conditional update performed under the lock, which gives the same
//! guarantee as a `WHERE status = 'pending'` update on a SQL table.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    ActivityKind, Article, ArticleId, Keyword, KeywordId, KeywordStatus, NewArticle, NewKeyword, SharedError, Site,
    SiteId,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::services::SystemClock;
use crate::traits::{Clock, Store};

/// Activity log row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub site_id: SiteId,
    pub kind: ActivityKind,
    pub message: String,
    pub metadata: serde_json::Value,
    pub at: DateTime<Utc>,
}

/// Keyword row as written in a seed file; missing fields get defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedKeyword {
    #[serde(default)]
    pub id: KeywordId,
    #[serde(default)]
    pub site_id: Option<SiteId>,
    pub text: String,
    #[serde(default = "pending")]
    pub status: KeywordStatus,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub cluster_tag: Option<String>,
}

fn pending() -> KeywordStatus {
    KeywordStatus::Pending
}

/// JSON seed: sites with their cadence and the keyword pool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub keywords: Vec<SeedKeyword>,
}

impl SeedFile {
    pub fn from_json(json: &str) -> Result<Self, SharedError> {
        serde_json::from_str(json).map_err(|e| SharedError::SeedError { message: e.to_string() })
    }

    pub async fn load(path: &Path) -> OrchestratorResult<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Ok(Self::from_json(&json)?)
    }
}

/// Full store contents, used for `--output` dumps and test assertions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub sites: Vec<Site>,
    pub keywords: Vec<Keyword>,
    pub articles: Vec<Article>,
    pub activity: Vec<ActivityEntry>,
}

#[derive(Debug, Default)]
struct Tables {
    sites: HashMap<SiteId, Site>,
    /// Insertion order is kept so snapshots are stable
    keywords: Vec<Keyword>,
    articles: Vec<Article>,
    activity: Vec<ActivityEntry>,
}

impl Tables {
    fn keyword_mut(&mut self, keyword_id: &KeywordId) -> Option<&mut Keyword> {
        self.keywords.iter_mut().find(|k| &k.id == keyword_id)
    }

    fn unique_slug(&self, site_id: &SiteId, base: &str) -> String {
        let taken = |slug: &str| self.articles.iter().any(|a| &a.site_id == site_id && a.slug == slug);
        if !taken(base) {
            return base.to_string();
        }
        (2u32..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| format!("{base}-{}", ArticleId::new()))
    }
}

/// Real in-process store
///
/// Clones share the same tables.
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            tables: Arc::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock used to stamp `created_at` on new rows
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build a store from a seed, validating every site's cadence
    ///
    /// A keyword seeded as `generating` has no live claim behind it (a dump
    /// taken mid-run) and is loaded as `pending`.
    pub fn from_seed(seed: SeedFile) -> OrchestratorResult<Self> {
        let store = Self::default();
        let now = store.clock.now();
        let mut tables = Tables::default();

        for site in seed.sites {
            site.cadence.validate()?;
            tables.sites.insert(site.id, site);
        }
        tables.keywords = seed
            .keywords
            .into_iter()
            .map(|k| {
                let status = if k.status.is_terminal_for_run() {
                    k.status
                } else {
                    warn!(keyword = %k.text, "Seeded keyword was mid-generation, loading it as pending");
                    KeywordStatus::Pending
                };
                Keyword {
                    id: k.id,
                    site_id: k.site_id,
                    text: k.text,
                    status,
                    priority: k.priority,
                    cluster_tag: k.cluster_tag,
                    created_at: now,
                }
            })
            .collect();

        debug!(
            sites = tables.sites.len(),
            keywords = tables.keywords.len(),
            "Seeded in-memory store"
        );
        Ok(Self {
            tables: Arc::new(Mutex::new(tables)),
            ..store
        })
    }

    pub async fn insert_site(&self, site: Site) {
        self.tables.lock().await.sites.insert(site.id, site);
    }

    pub async fn insert_keyword(&self, keyword: Keyword) {
        self.tables.lock().await.keywords.push(keyword);
    }

    pub async fn keyword(&self, keyword_id: &KeywordId) -> Option<Keyword> {
        let tables = self.tables.lock().await;
        tables.keywords.iter().find(|k| &k.id == keyword_id).cloned()
    }

    pub async fn site_ids(&self) -> Vec<SiteId> {
        let tables = self.tables.lock().await;
        let mut sites: Vec<&Site> = tables.sites.values().collect();
        sites.sort_by(|a, b| a.name.cmp(&b.name));
        sites.into_iter().map(|s| s.id).collect()
    }

    pub async fn articles_for(&self, site_id: &SiteId) -> Vec<Article> {
        let tables = self.tables.lock().await;
        tables.articles.iter().filter(|a| &a.site_id == site_id).cloned().collect()
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let tables = self.tables.lock().await;
        let mut sites: Vec<Site> = tables.sites.values().cloned().collect();
        sites.sort_by(|a, b| a.name.cmp(&b.name));
        StoreSnapshot {
            sites,
            keywords: tables.keywords.clone(),
            articles: tables.articles.clone(),
            activity: tables.activity.clone(),
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_site(&self, site_id: &SiteId) -> OrchestratorResult<Option<Site>> {
        Ok(self.tables.lock().await.sites.get(site_id).cloned())
    }

    async fn get_keywords(&self, ids: &[KeywordId]) -> OrchestratorResult<Vec<Keyword>> {
        let tables = self.tables.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.keywords.iter().find(|k| &k.id == id).cloned())
            .collect())
    }

    async fn count_articles_since(&self, site_id: &SiteId, since: DateTime<Utc>) -> OrchestratorResult<u32> {
        let tables = self.tables.lock().await;
        let count = tables
            .articles
            .iter()
            .filter(|a| &a.site_id == site_id && a.created_at >= since)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn claim_keyword(&self, keyword_id: &KeywordId) -> OrchestratorResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables.keyword_mut(keyword_id) {
            Some(keyword) if keyword.status.is_claimable() => {
                keyword.status = KeywordStatus::Generating;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_keyword(&self, keyword_id: &KeywordId) -> OrchestratorResult<()> {
        let mut tables = self.tables.lock().await;
        if let Some(keyword) = tables.keyword_mut(keyword_id) {
            // Archiving is an operator decision; releasing never undoes it
            if keyword.status != KeywordStatus::Archived {
                keyword.status = KeywordStatus::Pending;
            }
        }
        Ok(())
    }

    async fn mark_keyword_generated(&self, keyword_id: &KeywordId, status: KeywordStatus) -> OrchestratorResult<()> {
        if !matches!(status, KeywordStatus::Generated | KeywordStatus::Published) {
            return Err(OrchestratorError::store(
                "mark_keyword_generated",
                format!("{status} is not a generated status"),
            ));
        }
        let mut tables = self.tables.lock().await;
        let keyword = tables
            .keyword_mut(keyword_id)
            .ok_or(OrchestratorError::KeywordNotFound { keyword_id: *keyword_id })?;
        keyword.status = status;
        Ok(())
    }

    async fn insert_article(
        &self,
        site_id: &SiteId,
        keyword_id: Option<KeywordId>,
        payload: NewArticle,
    ) -> OrchestratorResult<Article> {
        let mut tables = self.tables.lock().await;
        if !tables.sites.contains_key(site_id) {
            return Err(OrchestratorError::SiteNotFound { site_id: *site_id });
        }

        let slug = tables.unique_slug(site_id, &payload.slug);
        let article = Article {
            id: ArticleId::new(),
            site_id: *site_id,
            keyword_id,
            title: payload.title,
            slug,
            body: payload.body,
            summary: payload.summary,
            faq: payload.faq,
            image_url: payload.image_url,
            image_alt: payload.image_alt,
            status: payload.status,
            published_at: payload.published_at,
            created_at: self.clock.now(),
        };
        tables.articles.push(article.clone());
        Ok(article)
    }

    async fn delete_article(&self, article_id: &ArticleId) -> OrchestratorResult<Option<Article>> {
        let mut tables = self.tables.lock().await;
        let position = tables.articles.iter().position(|a| &a.id == article_id);
        Ok(position.map(|index| tables.articles.remove(index)))
    }

    async fn archive_keyword(&self, keyword_id: &KeywordId) -> OrchestratorResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables.keyword_mut(keyword_id) {
            Some(keyword) if keyword.status != KeywordStatus::Generating => {
                keyword.status = KeywordStatus::Archived;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn add_keywords(&self, site_id: Option<SiteId>, entries: Vec<NewKeyword>) -> OrchestratorResult<Vec<Keyword>> {
        let now = self.clock.now();
        let mut tables = self.tables.lock().await;
        let added: Vec<Keyword> = entries
            .into_iter()
            .map(|entry| Keyword {
                id: KeywordId::new(),
                site_id,
                text: entry.text.trim().to_string(),
                status: KeywordStatus::Pending,
                priority: entry.priority,
                cluster_tag: entry.cluster_tag,
                created_at: now,
            })
            .collect();
        tables.keywords.extend(added.iter().cloned());
        Ok(added)
    }

    async fn log_activity(
        &self,
        site_id: &SiteId,
        kind: ActivityKind,
        message: &str,
        metadata: serde_json::Value,
    ) -> OrchestratorResult<()> {
        self.tables.lock().await.activity.push(ActivityEntry {
            site_id: *site_id,
            kind,
            message: message.to_string(),
            metadata,
            at: self.clock.now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{ArticleStatus, CadenceConfig};

    fn draft(slug: &str) -> NewArticle {
        NewArticle {
            title: "Title".to_string(),
            slug: slug.to_string(),
            body: "Body".to_string(),
            summary: "Summary".to_string(),
            faq: Vec::new(),
            image_url: None,
            image_alt: None,
            status: ArticleStatus::Draft,
            published_at: None,
        }
    }

    async fn store_with_keyword() -> (InMemoryStore, Site, KeywordId) {
        let store = InMemoryStore::new();
        let site = Site::new("Garden Weekly", CadenceConfig::default());
        store.insert_site(site.clone()).await;
        let added = store
            .add_keywords(Some(site.id), vec![NewKeyword::new("  compost tea ")])
            .await
            .unwrap();
        (store, site, added[0].id)
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let (store, _, keyword_id) = store_with_keyword().await;

        assert!(store.claim_keyword(&keyword_id).await.unwrap());
        assert!(!store.claim_keyword(&keyword_id).await.unwrap());

        store.release_keyword(&keyword_id).await.unwrap();
        assert!(store.claim_keyword(&keyword_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_added_keywords_are_trimmed_and_pending() {
        let (store, _, keyword_id) = store_with_keyword().await;
        let keyword = store.keyword(&keyword_id).await.unwrap();
        assert_eq!(keyword.text, "compost tea");
        assert_eq!(keyword.status, KeywordStatus::Pending);
    }

    #[tokio::test]
    async fn test_slugs_are_unique_per_site() {
        let (store, site, _) = store_with_keyword().await;
        let other = Site::new("Other", CadenceConfig::default());
        store.insert_site(other.clone()).await;

        let a = store.insert_article(&site.id, None, draft("compost")).await.unwrap();
        let b = store.insert_article(&site.id, None, draft("compost")).await.unwrap();
        let c = store.insert_article(&site.id, None, draft("compost")).await.unwrap();
        let d = store.insert_article(&other.id, None, draft("compost")).await.unwrap();

        assert_eq!(a.slug, "compost");
        assert_eq!(b.slug, "compost-2");
        assert_eq!(c.slug, "compost-3");
        assert_eq!(d.slug, "compost");
    }

    #[tokio::test]
    async fn test_count_articles_since_filters_by_site_and_time() {
        let (store, site, _) = store_with_keyword().await;
        let before = Utc::now() - chrono::Duration::seconds(1);
        store.insert_article(&site.id, None, draft("one")).await.unwrap();

        assert_eq!(store.count_articles_since(&site.id, before).await.unwrap(), 1);
        let later = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(store.count_articles_since(&site.id, later).await.unwrap(), 0);
        assert_eq!(store.count_articles_since(&SiteId::new(), before).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_archive_refuses_claimed_keyword() {
        let (store, _, keyword_id) = store_with_keyword().await;
        store.claim_keyword(&keyword_id).await.unwrap();
        assert!(!store.archive_keyword(&keyword_id).await.unwrap());

        store.release_keyword(&keyword_id).await.unwrap();
        assert!(store.archive_keyword(&keyword_id).await.unwrap());

        store.release_keyword(&keyword_id).await.unwrap();
        assert_eq!(store.keyword(&keyword_id).await.unwrap().status, KeywordStatus::Archived);
    }

    #[tokio::test]
    async fn test_mark_generated_rejects_non_generated_status() {
        let (store, _, keyword_id) = store_with_keyword().await;
        let err = store
            .mark_keyword_generated(&keyword_id, KeywordStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Store { .. }));
    }

    #[tokio::test]
    async fn test_seed_file_defaults() {
        let site_id = SiteId::new();
        let json = format!(
            r#"{{
                "sites": [{{ "id": "{site_id}", "name": "Seeded" }}],
                "keywords": [{{ "site_id": "{site_id}", "text": "raised beds", "priority": 2 }}]
            }}"#
        );
        let seed = SeedFile::from_json(&json).unwrap();
        let store = InMemoryStore::from_seed(seed).unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.sites.len(), 1);
        assert_eq!(snapshot.sites[0].cadence, CadenceConfig::default());
        assert_eq!(snapshot.keywords[0].status, KeywordStatus::Pending);
        assert_eq!(snapshot.keywords[0].priority, 2);
    }

    #[tokio::test]
    async fn test_seeded_generating_keyword_is_claimable() {
        let site_id = SiteId::new();
        let json = format!(
            r#"{{
                "sites": [{{ "id": "{site_id}", "name": "Dumped" }}],
                "keywords": [
                    {{ "site_id": "{site_id}", "text": "leaf mould", "status": "generating" }},
                    {{ "site_id": "{site_id}", "text": "mulch", "status": "archived" }}
                ]
            }}"#
        );
        let store = InMemoryStore::from_seed(SeedFile::from_json(&json).unwrap()).unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.keywords[0].status, KeywordStatus::Pending);
        assert_eq!(snapshot.keywords[1].status, KeywordStatus::Archived);
        assert!(store.claim_keyword(&snapshot.keywords[0].id).await.unwrap());
    }

    #[test]
    fn test_malformed_seed_is_seed_error() {
        let err = SeedFile::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SharedError::SeedError { .. }));
    }
}
