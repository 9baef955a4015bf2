//! Generation pipeline for one claimed keyword
//!
//! generate -> (improve) -> (image) -> persist -> resolve claim.
//!
//! Only generation and persistence can fail the pipeline. Improvement, image
//! generation and activity logging are best-effort: their errors are logged
//! and dropped. Every exit path resolves the keyword claim, so a keyword is
//! never left in `generating` once `run` returns. Persistence covers both the
//! article insert and the keyword status write; if the second fails the
//! article is removed again before the claim is released.

use shared::{
    site_debug, site_error, site_info, site_warn, slugify, ActivityKind, Article, ArticleStatus, CadenceConfig,
    GeneratedDraft, ImprovementOptions, Keyword, KeywordStatus, NewArticle, Site,
};

use crate::error::OrchestratorError;
use crate::traits::{Clock, ContentGenerator, ContentImprover, ImageGenerator, Store};

/// Per-run switches derived from cadence or from a manual request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub auto_publish: bool,
    pub improvement: Option<ImprovementOptions>,
    /// Image generation is skipped when no model is configured
    pub image_model: Option<String>,
}

impl PipelineOptions {
    pub fn from_cadence(cadence: &CadenceConfig) -> Self {
        Self {
            auto_publish: cadence.auto_publish,
            improvement: cadence.improvement.clone(),
            image_model: cadence.image_model.clone(),
        }
    }
}

/// Result of one pipeline execution
#[derive(Debug)]
pub enum PipelineOutcome {
    Succeeded {
        article: Article,
        improved: bool,
    },
    Failed {
        /// Keyword text, used as the display label
        keyword: String,
        error: OrchestratorError,
    },
}

impl PipelineOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, PipelineOutcome::Succeeded { .. })
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            PipelineOutcome::Succeeded { article, .. } => Some(&article.title),
            PipelineOutcome::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            PipelineOutcome::Succeeded { .. } => None,
            PipelineOutcome::Failed { error, .. } => Some(error.to_string()),
        }
    }
}

/// Borrowed view over the services one pipeline execution needs
pub struct GenerationPipeline<'a, G, I, M, S>
where
    G: ContentGenerator + ?Sized,
    I: ContentImprover + ?Sized,
    M: ImageGenerator + ?Sized,
    S: Store + ?Sized,
{
    generator: &'a G,
    improver: &'a I,
    images: &'a M,
    store: &'a S,
    clock: &'a dyn Clock,
}

impl<'a, G, I, M, S> GenerationPipeline<'a, G, I, M, S>
where
    G: ContentGenerator + ?Sized,
    I: ContentImprover + ?Sized,
    M: ImageGenerator + ?Sized,
    S: Store + ?Sized,
{
    pub fn new(generator: &'a G, improver: &'a I, images: &'a M, store: &'a S, clock: &'a dyn Clock) -> Self {
        Self {
            generator,
            improver,
            images,
            store,
            clock,
        }
    }

    /// Run the pipeline for a keyword already claimed by the caller
    pub async fn run(&self, site: &Site, keyword: &Keyword, options: &PipelineOptions) -> PipelineOutcome {
        let style_hint = keyword.cluster_tag.clone().or_else(|| site.style_hint.clone());

        let draft = match self.generator.generate(&keyword.text, style_hint).await {
            Ok(draft) => draft,
            Err(e) => {
                site_warn!(site.id, keyword = %keyword.text, error = %e, "❌ Content generation failed");
                self.release_claim(site, keyword).await;
                return PipelineOutcome::Failed {
                    keyword: keyword.text.clone(),
                    error: into_generation_error(e),
                };
            }
        };

        let (draft, improved) = self.improve_best_effort(site, draft, options.improvement.as_ref()).await;

        let image = match &options.image_model {
            Some(model) => self.image_best_effort(site, keyword, &draft, model).await,
            None => None,
        };

        let now = self.clock.now();
        let (status, published_at) = if options.auto_publish {
            (ArticleStatus::Published, Some(now))
        } else {
            (ArticleStatus::Draft, None)
        };

        let slug = match slugify(&draft.slug) {
            s if s.is_empty() => slugify(&draft.title),
            s => s,
        };

        let payload = NewArticle {
            title: draft.title,
            slug,
            body: draft.body,
            summary: draft.summary,
            faq: draft.faq,
            image_url: image.as_ref().map(|i| i.url.clone()),
            image_alt: image.map(|i| i.alt),
            status,
            published_at,
        };

        let article = match self.store.insert_article(&site.id, Some(keyword.id), payload).await {
            Ok(article) => article,
            Err(e) => {
                site_error!(site.id, keyword = %keyword.text, error = %e, "❌ Failed to persist article");
                self.release_claim(site, keyword).await;
                return PipelineOutcome::Failed {
                    keyword: keyword.text.clone(),
                    error: into_persistence_error(e),
                };
            }
        };

        let resolved = if options.auto_publish {
            KeywordStatus::Published
        } else {
            KeywordStatus::Generated
        };
        // The status write is part of persistence: a pending keyword must not
        // have an article, or the next allocation writes a duplicate
        if let Err(e) = self.store.mark_keyword_generated(&keyword.id, resolved).await {
            site_error!(site.id, keyword = %keyword.text, error = %e, "❌ Failed to resolve keyword claim");
            if let Err(e) = self.store.delete_article(&article.id).await {
                site_error!(site.id, article = %article.id, error = %e, "❌ Failed to roll back article");
            }
            self.release_claim(site, keyword).await;
            return PipelineOutcome::Failed {
                keyword: keyword.text.clone(),
                error: into_persistence_error(e),
            };
        }

        // Best-effort: activity log failures never fail the pipeline
        let metadata = serde_json::json!({
            "article_id": article.id.to_string(),
            "keyword_id": keyword.id.to_string(),
            "status": article.status.to_string(),
            "improved": improved,
        });
        let message = format!("Generated \"{}\" from keyword \"{}\"", article.title, keyword.text);
        if let Err(e) = self
            .store
            .log_activity(&site.id, ActivityKind::ArticleGenerated, &message, metadata)
            .await
        {
            site_warn!(site.id, error = %e, "⚠️ Activity log write failed");
        }

        site_info!(site.id, title = %article.title, status = %article.status, "✅ Article generated");
        PipelineOutcome::Succeeded { article, improved }
    }

    /// Best-effort: returns the original draft when the pass fails
    async fn improve_best_effort(
        &self,
        site: &Site,
        draft: GeneratedDraft,
        options: Option<&ImprovementOptions>,
    ) -> (GeneratedDraft, bool) {
        let Some(options) = options else {
            return (draft, false);
        };

        match self.improver.improve(&draft, options).await {
            Ok(improved) => {
                site_debug!(site.id, mode = options.mode.as_str(), "✨ Draft improved");
                (improved, true)
            }
            Err(e) => {
                site_warn!(site.id, error = %e, "⚠️ Improvement failed, keeping original draft");
                (draft, false)
            }
        }
    }

    /// Best-effort: any failure yields no image
    async fn image_best_effort(
        &self,
        site: &Site,
        keyword: &Keyword,
        draft: &GeneratedDraft,
        model: &str,
    ) -> Option<shared::ImageAsset> {
        let prompt = image_prompt(&draft.title, &keyword.text);
        match self.images.generate(&prompt, model, &site.id).await {
            Ok(Some(image)) => Some(image),
            Ok(None) => {
                site_debug!(site.id, "No image returned");
                None
            }
            Err(e) => {
                site_warn!(site.id, error = %e, "⚠️ Image generation failed, continuing without image");
                None
            }
        }
    }

    async fn release_claim(&self, site: &Site, keyword: &Keyword) {
        if let Err(e) = self.store.release_keyword(&keyword.id).await {
            site_error!(site.id, keyword = %keyword.text, error = %e, "❌ Failed to release keyword claim");
        }
    }
}

/// Prompt handed to the image generator
pub fn image_prompt(title: &str, keyword: &str) -> String {
    format!("Editorial featured image for a blog article titled \"{title}\" about {keyword}. No text in the image.")
}

fn into_generation_error(err: OrchestratorError) -> OrchestratorError {
    match err {
        err @ OrchestratorError::Generation { .. } => err,
        other => OrchestratorError::Generation {
            message: other.to_string(),
        },
    }
}

fn into_persistence_error(err: OrchestratorError) -> OrchestratorError {
    match err {
        err @ OrchestratorError::Persistence { .. } => err,
        other => OrchestratorError::Persistence {
            message: other.to_string(),
        },
    }
}
