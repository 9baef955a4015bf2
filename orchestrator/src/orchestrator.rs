//! Main orchestrator implementation
//!
//! Coordinates bulk, manual and scheduled generation across sites. All
//! external effects go through injected services; the run loop itself is
//! strictly sequential, so one pipeline finishes before the next starts.

use std::sync::Arc;

use serde::Serialize;
use shared::{
    logging, site_debug, site_error, site_info, site_warn, ActivityKind, Article, ArticleId, ImprovementOptions, Keyword,
    KeywordId, NewKeyword, Site, SiteId,
};

use crate::{
    allocator::KeywordAllocator,
    core::{
        distribute_budget, format_error_entry, CadenceWindow, PeriodStarts, ProgressReporter, QuotaCounts,
        QuotaDecision, QuotaGate, RunState, RunUpdate,
    },
    error::{OrchestratorError, OrchestratorResult},
    pipeline::{GenerationPipeline, PipelineOptions, PipelineOutcome},
    services::SystemClock,
    traits::{Clock, ContentGenerator, ContentImprover, ImageGenerator, Store},
};

/// One site's slice of a bulk run
#[derive(Debug, Clone, Serialize)]
pub struct RunTask {
    pub site: Site,
    pub keyword_ids: Vec<KeywordId>,
    pub auto_publish: bool,
    pub share_count: u32,
}

impl RunTask {
    pub fn site_id(&self) -> SiteId {
        self.site.id
    }

    pub fn site_name(&self) -> &str {
        &self.site.name
    }
}

/// Validated bulk run with per-site rejections
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunPlan {
    pub tasks: Vec<RunTask>,
    pub errors: Vec<String>,
}

impl RunPlan {
    /// Sum of all shares; the progress total for the run
    pub fn total(&self) -> u32 {
        self.tasks.iter().map(|t| t.share_count).sum()
    }
}

/// End-of-run report
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub state: RunState,
}

/// Result of a single manual or scheduled generation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunOneOutcome {
    pub success: bool,
    pub title: Option<String>,
    pub error: Option<String>,
    pub improved: bool,
    pub article_id: Option<ArticleId>,
}

impl From<PipelineOutcome> for RunOneOutcome {
    fn from(outcome: PipelineOutcome) -> Self {
        match outcome {
            PipelineOutcome::Succeeded { article, improved } => Self {
                success: true,
                title: Some(article.title),
                error: None,
                improved,
                article_id: Some(article.id),
            },
            PipelineOutcome::Failed { error, .. } => Self {
                success: false,
                error: Some(error.to_string()),
                ..Self::default()
            },
        }
    }
}

/// Per-site result of a scheduled (cron) pass
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledOutcome {
    pub site_id: SiteId,
    pub decision: Option<QuotaDecision>,
    pub outcome: Option<RunOneOutcome>,
    /// Set when the site was skipped for a reason other than the gate
    pub skipped_reason: Option<String>,
}

/// Main orchestrator that coordinates generation runs
pub struct Orchestrator<G, I, M, S>
where
    G: ContentGenerator + Send + Sync + 'static,
    I: ContentImprover + Send + Sync + 'static,
    M: ImageGenerator + Send + Sync + 'static,
    S: Store + Send + Sync + 'static,
{
    /// Injected services
    generator: G,
    improver: I,
    images: M,
    store: S,
    clock: Arc<dyn Clock>,
}

impl<G, I, M, S> Orchestrator<G, I, M, S>
where
    G: ContentGenerator + Send + Sync + 'static,
    I: ContentImprover + Send + Sync + 'static,
    M: ImageGenerator + Send + Sync + 'static,
    S: Store + Send + Sync + 'static,
{
    /// Create new orchestrator with injected dependencies
    pub fn new(generator: G, improver: I, images: M, store: S) -> Self {
        Self {
            generator,
            improver,
            images,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the wall clock (tests, replays)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn pipeline(&self) -> GenerationPipeline<'_, G, I, M, S> {
        GenerationPipeline::new(&self.generator, &self.improver, &self.images, &self.store, self.clock.as_ref())
    }

    fn allocator(&self) -> KeywordAllocator<'_, S> {
        KeywordAllocator::new(&self.store)
    }

    /// Articles created today and this week, in the site's local time
    pub async fn quota_counts(&self, site: &Site) -> OrchestratorResult<QuotaCounts> {
        let starts = PeriodStarts::for_instant(self.clock.now(), site.cadence.utc_offset_minutes);
        let today = self.store.count_articles_since(&site.id, starts.day_start).await?;
        let this_week = self.store.count_articles_since(&site.id, starts.week_start).await?;
        Ok(QuotaCounts { today, this_week })
    }

    /// The single quota gate call shared by manual and scheduled paths
    pub async fn check_quota(&self, site: &Site, window: CadenceWindow) -> OrchestratorResult<QuotaDecision> {
        let counts = self.quota_counts(site).await?;
        let decision = QuotaGate::evaluate(&site.cadence, counts, self.clock.now(), window);
        site_debug!(
            site.id,
            today = counts.today,
            this_week = counts.this_week,
            window = ?window,
            "Quota decision: {}",
            decision
        );
        Ok(decision)
    }

    /// Validate a bulk request and split the budget across accepted sites
    pub async fn prepare_run(&self, site_ids: &[SiteId], total_budget: u32) -> OrchestratorResult<RunPlan> {
        if site_ids.is_empty() {
            return Err(OrchestratorError::InvalidRequest {
                message: "no sites selected".to_string(),
            });
        }
        if total_budget == 0 {
            return Err(OrchestratorError::InvalidRequest {
                message: "article budget must be at least 1".to_string(),
            });
        }

        let mut accepted = Vec::new();
        let mut errors = Vec::new();

        for site_id in site_ids {
            let Some(site) = self.store.get_site(site_id).await? else {
                errors.push(format!("{site_id}: site not found"));
                continue;
            };

            let keyword_ids = site.cadence.selected_keyword_ids.clone();
            if keyword_ids.is_empty() {
                errors.push(format!("{}: no keywords selected", site.name));
                continue;
            }

            let keywords = self.store.get_keywords(&keyword_ids).await?;
            if !keywords.iter().any(|k| k.status.is_claimable() && k.is_usable_by(&site.id)) {
                errors.push(format!("{}: no pending keywords", site.name));
                continue;
            }

            accepted.push((site, keyword_ids));
        }

        let shares = distribute_budget(total_budget, accepted.len());
        let tasks = accepted
            .into_iter()
            .zip(shares)
            .map(|((site, keyword_ids), share_count)| RunTask {
                auto_publish: site.cadence.auto_publish,
                site,
                keyword_ids,
                share_count,
            })
            .collect::<Vec<_>>();

        logging::log_progress(
            "Run prepared",
            &format!("{} site(s) accepted, {} rejected", tasks.len(), errors.len()),
        );

        Ok(RunPlan { tasks, errors })
    }

    /// Execute a prepared bulk run
    ///
    /// Sites run in plan order, each up to its share. A site stops early when
    /// its quota is reached or it runs out of keywords; its leftover share is
    /// not handed to other sites. Pipeline failures are recorded and the loop
    /// continues. Cancellation is checked before every iteration; a cancel that
    /// arrives during the last pipeline still marks the summary as cancelled.
    pub async fn execute(&self, plan: &RunPlan, reporter: &ProgressReporter) -> RunSummary {
        let total = plan.total();
        reporter.start(total);
        logging::log_startup(&format!("bulk run: {} article(s) across {} site(s)", total, plan.tasks.len()));

        let pipeline = self.pipeline();
        let allocator = self.allocator();
        let mut completed = 0u32;
        let mut cancelled = false;

        'sites: for task in &plan.tasks {
            let site = &task.site;
            let options = PipelineOptions {
                auto_publish: task.auto_publish,
                ..PipelineOptions::from_cadence(&site.cadence)
            };

            for _ in 0..task.share_count {
                if reporter.is_cancel_requested() {
                    cancelled = true;
                    break 'sites;
                }

                match self.check_quota(site, CadenceWindow::Bypass).await {
                    Ok(decision) if decision.is_eligible() => {}
                    Ok(decision) => {
                        site_info!(site.id, "⏸️ Stopping site: {}", decision);
                        break;
                    }
                    Err(e) => {
                        site_warn!(site.id, error = %e, "⚠️ Quota check failed, skipping site");
                        break;
                    }
                }

                let keyword = match allocator.allocate_next(&site.id, &task.keyword_ids).await {
                    Ok(Some(keyword)) => keyword,
                    Ok(None) => {
                        site_info!(site.id, "⏸️ No pending keywords left");
                        break;
                    }
                    Err(e) => {
                        site_warn!(site.id, error = %e, "⚠️ Keyword allocation failed, skipping site");
                        break;
                    }
                };

                reporter.update(RunUpdate::new().label(format!("{}: {}", site.name, keyword.text)));

                let outcome = pipeline.run(site, &keyword, &options).await;
                completed += 1;

                let update = match &outcome {
                    PipelineOutcome::Succeeded { article, .. } => {
                        RunUpdate::new().completed(completed).result(site.name.clone(), article.title.clone())
                    }
                    PipelineOutcome::Failed { keyword, error } => RunUpdate::new()
                        .completed(completed)
                        .error(format_error_entry(keyword, &error.to_string())),
                };
                reporter.update(update);
            }
        }

        let cancelled = cancelled || reporter.is_cancel_requested();
        let state = reporter.finish();
        if cancelled {
            logging::log_shutdown(&format!("run cancelled after {completed} article(s)"));
        }
        logging::log_success(&format!("Run finished: {}", state.summary_line()));

        RunSummary {
            succeeded: state.succeeded(),
            failed: state.failed(),
            cancelled,
            state,
        }
    }

    /// Generate one article now for a site (operator "run now")
    ///
    /// Bypasses the weekday/hour window but not the daily/weekly caps.
    pub async fn run_one(
        &self,
        site_id: &SiteId,
        keyword_ids: &[KeywordId],
        auto_publish: bool,
        improvement: Option<ImprovementOptions>,
    ) -> OrchestratorResult<RunOneOutcome> {
        let site = self.load_site(site_id).await?;

        let decision = self.check_quota(&site, CadenceWindow::Bypass).await?;
        if !decision.is_eligible() {
            return Err(OrchestratorError::QuotaExceeded {
                site_id: site.id,
                decision,
            });
        }

        let options = PipelineOptions {
            auto_publish,
            improvement,
            image_model: site.cadence.image_model.clone(),
        };
        self.generate_for_site(&site, keyword_ids, &options).await
    }

    /// Cron entry point: one article per eligible site, cadence window enforced
    pub async fn run_scheduled(&self, site_ids: &[SiteId]) -> Vec<ScheduledOutcome> {
        let mut outcomes = Vec::with_capacity(site_ids.len());

        for site_id in site_ids {
            let site = match self.load_site(site_id).await {
                Ok(site) => site,
                Err(e) => {
                    outcomes.push(ScheduledOutcome {
                        site_id: *site_id,
                        decision: None,
                        outcome: None,
                        skipped_reason: Some(e.to_string()),
                    });
                    continue;
                }
            };

            let decision = match self.check_quota(&site, CadenceWindow::Enforce).await {
                Ok(decision) => decision,
                Err(e) => {
                    site_warn!(site.id, error = %e, "⚠️ Quota check failed");
                    outcomes.push(ScheduledOutcome {
                        site_id: site.id,
                        decision: None,
                        outcome: None,
                        skipped_reason: Some(e.to_string()),
                    });
                    continue;
                }
            };

            if !decision.is_eligible() {
                site_debug!(site.id, "Scheduled generation skipped: {}", decision);
                outcomes.push(ScheduledOutcome {
                    site_id: site.id,
                    decision: Some(decision),
                    outcome: None,
                    skipped_reason: None,
                });
                continue;
            }

            let options = PipelineOptions::from_cadence(&site.cadence);
            let result = self
                .generate_for_site(&site, &site.cadence.selected_keyword_ids, &options)
                .await;
            let (outcome, skipped_reason) = match result {
                Ok(outcome) => (Some(outcome), None),
                Err(e) => (None, Some(e.to_string())),
            };
            outcomes.push(ScheduledOutcome {
                site_id: site.id,
                decision: Some(decision),
                outcome,
                skipped_reason,
            });
        }

        outcomes
    }

    /// Delete an article and return its source keyword to the pool
    pub async fn delete_article(&self, article_id: &ArticleId) -> OrchestratorResult<Article> {
        let article = self
            .store
            .delete_article(article_id)
            .await?
            .ok_or(OrchestratorError::ArticleNotFound { article_id: *article_id })?;

        // The deletion has happened; a failed release is reported, not returned
        if let Some(keyword_id) = &article.keyword_id {
            if let Err(e) = self.store.release_keyword(keyword_id).await {
                site_error!(
                    article.site_id,
                    keyword = %keyword_id,
                    error = %e,
                    "❌ Failed to release keyword of deleted article"
                );
            }
        }

        let metadata = serde_json::json!({
            "article_id": article.id.to_string(),
            "keyword_id": article.keyword_id.map(|k| k.to_string()),
        });
        let message = format!("Deleted \"{}\"", article.title);
        if let Err(e) = self
            .store
            .log_activity(&article.site_id, ActivityKind::ArticleDeleted, &message, metadata)
            .await
        {
            site_warn!(article.site_id, error = %e, "⚠️ Activity log write failed");
        }

        site_info!(article.site_id, title = %article.title, "🗑️ Article deleted, keyword released");
        Ok(article)
    }

    /// Operator action: retire a keyword from the pool
    pub async fn archive_keyword(&self, keyword_id: &KeywordId) -> OrchestratorResult<Keyword> {
        let mut keyword = self
            .store
            .get_keywords(std::slice::from_ref(keyword_id))
            .await?
            .into_iter()
            .next()
            .ok_or(OrchestratorError::KeywordNotFound { keyword_id: *keyword_id })?;

        if !self.store.archive_keyword(keyword_id).await? {
            return Err(OrchestratorError::InvalidRequest {
                message: format!("keyword \"{}\" is being generated and cannot be archived", keyword.text),
            });
        }
        keyword.status = shared::KeywordStatus::Archived;

        if let Some(site_id) = &keyword.site_id {
            let metadata = serde_json::json!({ "keyword_id": keyword.id.to_string() });
            let message = format!("Archived keyword \"{}\"", keyword.text);
            if let Err(e) = self
                .store
                .log_activity(site_id, ActivityKind::KeywordArchived, &message, metadata)
                .await
            {
                site_warn!(site_id, error = %e, "⚠️ Activity log write failed");
            }
        }

        Ok(keyword)
    }

    /// Import keywords as pending; `None` adds them to the global pool
    pub async fn import_keywords(
        &self,
        site_id: Option<SiteId>,
        entries: Vec<NewKeyword>,
    ) -> OrchestratorResult<Vec<Keyword>> {
        if let Some(site_id) = &site_id {
            self.load_site(site_id).await?;
        }
        let entries: Vec<NewKeyword> = entries.into_iter().filter(|e| !e.text.trim().is_empty()).collect();
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        self.store.add_keywords(site_id, entries).await
    }

    async fn load_site(&self, site_id: &SiteId) -> OrchestratorResult<Site> {
        self.store
            .get_site(site_id)
            .await?
            .ok_or(OrchestratorError::SiteNotFound { site_id: *site_id })
    }

    /// Allocate and run the pipeline once; gate checks happen in the callers
    async fn generate_for_site(
        &self,
        site: &Site,
        keyword_ids: &[KeywordId],
        options: &PipelineOptions,
    ) -> OrchestratorResult<RunOneOutcome> {
        let keyword = self
            .allocator()
            .allocate_next(&site.id, keyword_ids)
            .await?
            .ok_or(OrchestratorError::NoKeywordAvailable { site_id: site.id })?;

        let outcome = self.pipeline().run(site, &keyword, options).await;
        Ok(RunOneOutcome::from(outcome))
    }
}
