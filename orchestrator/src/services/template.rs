//! Offline collaborators
//!
//! `TemplateContentGenerator` writes a plausible article from the keyword alone,
//! with no network access. It backs `--provider template` dry runs and the
//! integration tests. The same keyword always yields the same draft.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::{slugify, FaqEntry, GeneratedDraft, ImageAsset, ImprovementOptions, SiteId};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::{ContentGenerator, ContentImprover, ImageGenerator};

const TITLE_PATTERNS: &[&str] = &[
    "The Complete Guide to {}",
    "{}: What You Need to Know",
    "Everything About {}",
    "A Practical Look at {}",
];

const INTRO_PATTERNS: &[&str] = &[
    "If you have been wondering about {}, you are in the right place.",
    "{} comes up often, and for good reason.",
    "Getting {} right takes less effort than most people expect.",
];

/// Deterministic offline article generator
#[derive(Debug, Clone, Default)]
pub struct TemplateContentGenerator {
    failure_marker: Option<String>,
    delay: Option<Duration>,
}

impl TemplateContentGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail generation for any keyword containing `marker`
    pub fn with_failure_marker(mut self, marker: impl Into<String>) -> Self {
        self.failure_marker = Some(marker.into());
        self
    }

    /// Simulate remote latency
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn rng_for(keyword: &str) -> StdRng {
        let mut hasher = DefaultHasher::new();
        keyword.hash(&mut hasher);
        StdRng::seed_from_u64(hasher.finish())
    }

    /// Build the draft for a keyword without any I/O
    pub fn render(keyword: &str, style_hint: Option<&str>) -> GeneratedDraft {
        let mut rng = Self::rng_for(keyword);
        let topic = capitalize(keyword.trim());
        let title = TITLE_PATTERNS
            .choose(&mut rng)
            .unwrap_or(&TITLE_PATTERNS[0])
            .replace("{}", &topic);
        let intro = INTRO_PATTERNS
            .choose(&mut rng)
            .unwrap_or(&INTRO_PATTERNS[0])
            .replace("{}", &topic);

        let mut body = format!("# {title}\n\n{intro}\n\n");
        if let Some(style) = style_hint {
            body.push_str(&format!("_Part of our {style} series._\n\n"));
        }
        body.push_str(&format!(
            "## Why {topic} matters\n\nA short overview of {keyword} and where it fits.\n\n\
             ## Getting started\n\nStart small, measure, and adjust as you learn more about {keyword}.\n"
        ));

        GeneratedDraft {
            slug: slugify(&title),
            summary: format!("A concise introduction to {keyword}."),
            faq: vec![
                FaqEntry {
                    question: format!("What is {keyword}?"),
                    answer: format!("{topic} is covered in detail in the sections above."),
                },
                FaqEntry {
                    question: format!("Where should I start with {keyword}?"),
                    answer: "Begin with the basics in the getting started section.".to_string(),
                },
            ],
            title,
            body,
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl ContentGenerator for TemplateContentGenerator {
    async fn generate(&self, keyword: &str, style_hint: Option<String>) -> OrchestratorResult<GeneratedDraft> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if keyword.trim().is_empty() {
            return Err(OrchestratorError::generation("empty keyword"));
        }
        if let Some(marker) = &self.failure_marker {
            if keyword.contains(marker.as_str()) {
                return Err(OrchestratorError::generation(format!(
                    "template generator refused keyword containing \"{marker}\""
                )));
            }
        }
        Ok(Self::render(keyword, style_hint.as_deref()))
    }
}

/// Improver that returns the draft unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughImprover;

#[async_trait]
impl ContentImprover for PassthroughImprover {
    async fn improve(&self, draft: &GeneratedDraft, _options: &ImprovementOptions) -> OrchestratorResult<GeneratedDraft> {
        Ok(draft.clone())
    }
}

/// Image service that never produces an image
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImageGenerator;

#[async_trait]
impl ImageGenerator for NoImageGenerator {
    async fn generate(&self, _prompt: &str, _model: &str, _site_id: &SiteId) -> OrchestratorResult<Option<ImageAsset>> {
        Ok(None)
    }
}
