//! Test helpers and builder patterns for orchestrator tests
//!
//! This module provides convenient helper functions and builder patterns
//! to reduce test boilerplate and improve maintainability.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orchestrator::services::{InMemoryStore, StoreSnapshot};
use orchestrator::traits::{MockContentGenerator, MockContentImprover, MockImageGenerator};
use orchestrator::{Clock, Orchestrator, OrchestratorError, OrchestratorResult, Store};
use shared::{
    ActivityKind, Article, ArticleId, ArticleStatus, Keyword, KeywordId, KeywordStatus, NewArticle, NewKeyword, Site,
    SiteId,
};

use super::fixtures::TestFixtures;

pub type TestOrchestrator = Orchestrator<MockContentGenerator, MockContentImprover, MockImageGenerator, InMemoryStore>;

/// Settable clock shared by the orchestrator and the store
#[derive(Clone)]
pub struct TestClock(Arc<Mutex<DateTime<Utc>>>);

impl TestClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// `InMemoryStore` whose next `failures` keyword status writes fail
#[derive(Clone)]
pub struct FlakyStatusStore {
    inner: InMemoryStore,
    failures: Arc<AtomicU32>,
}

impl FlakyStatusStore {
    pub fn new(inner: InMemoryStore, failures: u32) -> Self {
        Self {
            inner,
            failures: Arc::new(AtomicU32::new(failures)),
        }
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }
}

#[async_trait]
impl Store for FlakyStatusStore {
    async fn get_site(&self, site_id: &SiteId) -> OrchestratorResult<Option<Site>> {
        self.inner.get_site(site_id).await
    }

    async fn get_keywords(&self, ids: &[KeywordId]) -> OrchestratorResult<Vec<Keyword>> {
        self.inner.get_keywords(ids).await
    }

    async fn count_articles_since(&self, site_id: &SiteId, since: DateTime<Utc>) -> OrchestratorResult<u32> {
        self.inner.count_articles_since(site_id, since).await
    }

    async fn claim_keyword(&self, keyword_id: &KeywordId) -> OrchestratorResult<bool> {
        self.inner.claim_keyword(keyword_id).await
    }

    async fn release_keyword(&self, keyword_id: &KeywordId) -> OrchestratorResult<()> {
        self.inner.release_keyword(keyword_id).await
    }

    async fn mark_keyword_generated(&self, keyword_id: &KeywordId, status: KeywordStatus) -> OrchestratorResult<()> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(OrchestratorError::store("mark_keyword_generated", "connection reset"));
        }
        self.inner.mark_keyword_generated(keyword_id, status).await
    }

    async fn insert_article(
        &self,
        site_id: &SiteId,
        keyword_id: Option<KeywordId>,
        payload: NewArticle,
    ) -> OrchestratorResult<Article> {
        self.inner.insert_article(site_id, keyword_id, payload).await
    }

    async fn delete_article(&self, article_id: &ArticleId) -> OrchestratorResult<Option<Article>> {
        self.inner.delete_article(article_id).await
    }

    async fn archive_keyword(&self, keyword_id: &KeywordId) -> OrchestratorResult<bool> {
        self.inner.archive_keyword(keyword_id).await
    }

    async fn add_keywords(&self, site_id: Option<SiteId>, entries: Vec<NewKeyword>) -> OrchestratorResult<Vec<Keyword>> {
        self.inner.add_keywords(site_id, entries).await
    }

    async fn log_activity(
        &self,
        site_id: &SiteId,
        kind: ActivityKind,
        message: &str,
        metadata: serde_json::Value,
    ) -> OrchestratorResult<()> {
        self.inner.log_activity(site_id, kind, message, metadata).await
    }
}

/// Builder pattern for creating test orchestrators with sensible defaults
///
/// The store is a real `InMemoryStore`; the remote collaborators are mocks.
pub struct OrchestratorBuilder {
    generator: Option<MockContentGenerator>,
    improver: Option<MockContentImprover>,
    images: Option<MockImageGenerator>,
    clock: TestClock,
    sites: Vec<Site>,
    keywords: Vec<Keyword>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            generator: None,
            improver: None,
            images: None,
            clock: TestClock::new(TestFixtures::wednesday_morning()),
            sites: Vec::new(),
            keywords: Vec::new(),
        }
    }

    pub fn with_now(self, now: DateTime<Utc>) -> Self {
        self.clock.set(now);
        self
    }

    pub fn with_site(mut self, site: Site) -> Self {
        self.sites.push(site);
        self
    }

    pub fn with_keywords(mut self, keywords: impl IntoIterator<Item = Keyword>) -> Self {
        self.keywords.extend(keywords);
        self
    }

    /// Configure the generator mock with a setup function (replaces the default)
    pub fn with_generator<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockContentGenerator),
    {
        let mut generator = MockContentGenerator::new();
        setup(&mut generator);
        self.generator = Some(generator);
        self
    }

    /// Configure the improver mock with a setup function (replaces the default)
    pub fn with_improver<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockContentImprover),
    {
        let mut improver = MockContentImprover::new();
        setup(&mut improver);
        self.improver = Some(improver);
        self
    }

    /// Configure the image mock with a setup function (replaces the default)
    pub fn with_images<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockImageGenerator),
    {
        let mut images = MockImageGenerator::new();
        setup(&mut images);
        self.images = Some(images);
        self
    }

    pub async fn build(self) -> TestOrchestrator {
        self.build_with_clock().await.0
    }

    /// Build and also hand back the clock so tests can move time
    pub async fn build_with_clock(self) -> (TestOrchestrator, TestClock) {
        let clock = self.clock.clone();
        let store = InMemoryStore::new().with_clock(Arc::new(clock.clone()));
        for site in self.sites {
            store.insert_site(site).await;
        }
        for keyword in self.keywords {
            store.insert_keyword(keyword).await;
        }

        let generator = self.generator.unwrap_or_else(TestHelpers::echo_generator);
        let improver = self.improver.unwrap_or_else(|| {
            let mut improver = MockContentImprover::new();
            improver.expect_improve().returning(|draft, _| Ok(draft.clone()));
            improver
        });
        let images = self.images.unwrap_or_else(|| {
            let mut images = MockImageGenerator::new();
            images.expect_generate().returning(|_, _, _| Ok(None));
            images
        });

        let orchestrator =
            Orchestrator::new(generator, improver, images, store).with_clock(Arc::new(clock.clone()));
        (orchestrator, clock)
    }
}

/// Helper functions for common test operations
pub struct TestHelpers;

impl TestHelpers {
    /// Generator that titles every draft "About <keyword>"
    pub fn echo_generator() -> MockContentGenerator {
        let mut generator = MockContentGenerator::new();
        generator
            .expect_generate()
            .returning(|keyword, _| Ok(TestFixtures::draft(&format!("About {keyword}"))));
        generator
    }

    /// Generator that fails for keywords containing `marker`
    pub fn failing_generator(marker: &'static str) -> MockContentGenerator {
        let mut generator = MockContentGenerator::new();
        generator.expect_generate().returning(move |keyword, _| {
            if keyword.contains(marker) {
                Err(OrchestratorError::generation("upstream returned 500"))
            } else {
                Ok(TestFixtures::draft(&format!("About {keyword}")))
            }
        });
        generator
    }

    /// Insert `count` articles for a site at the store's current time
    pub async fn seed_articles(orchestrator: &TestOrchestrator, site_id: &SiteId, count: usize) {
        for i in 0..count {
            let payload = NewArticle {
                title: format!("Existing {i}"),
                slug: format!("existing-{i}"),
                body: String::new(),
                summary: String::new(),
                faq: Vec::new(),
                image_url: None,
                image_alt: None,
                status: ArticleStatus::Draft,
                published_at: None,
            };
            orchestrator.store().insert_article(site_id, None, payload).await.unwrap();
        }
    }

    pub async fn keyword_status(orchestrator: &TestOrchestrator, keyword_id: &KeywordId) -> KeywordStatus {
        orchestrator.store().keyword(keyword_id).await.unwrap().status
    }

    pub async fn snapshot(orchestrator: &TestOrchestrator) -> StoreSnapshot {
        orchestrator.store().snapshot().await
    }

    /// No claim may outlive a finished run
    pub fn assert_no_claims_left(snapshot: &StoreSnapshot) {
        let stuck: Vec<&str> = snapshot
            .keywords
            .iter()
            .filter(|k| !k.status.is_terminal_for_run())
            .map(|k| k.text.as_str())
            .collect();
        assert!(stuck.is_empty(), "keywords left generating: {stuck:?}");
    }

    pub fn articles_per_site(snapshot: &StoreSnapshot, site_id: &SiteId) -> usize {
        snapshot.articles.iter().filter(|a| &a.site_id == site_id).count()
    }
}
