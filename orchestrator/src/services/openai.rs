//! OpenAI-backed collaborators
//!
//! Chat completions for drafts and improvements, the images endpoint for
//! featured images. The API key is read from `OPENAI_API_KEY`, after loading
//! `.env` if one is present.

use async_trait::async_trait;
use serde::Deserialize;
use shared::{slugify, FaqEntry, GeneratedDraft, ImageAsset, ImprovementMode, ImprovementOptions, SiteId};
use tracing::debug;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::{ContentGenerator, ContentImprover, ImageGenerator};

const API_KEY_VAR: &str = "OPENAI_API_KEY";
const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const IMAGES_URL: &str = "https://api.openai.com/v1/images/generations";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Shared HTTP plumbing for the OpenAI services
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Load the key from the environment (and `.env`)
    pub fn from_env() -> OrchestratorResult<Self> {
        let _ = dotenv::dotenv();
        let api_key = std::env::var(API_KEY_VAR).map_err(|_| OrchestratorError::config(API_KEY_VAR))?;
        if api_key.trim().is_empty() {
            return Err(OrchestratorError::config(API_KEY_VAR));
        }
        Ok(Self::new(api_key))
    }

    async fn post_json(&self, url: &str, body: serde_json::Value) -> OrchestratorResult<serde_json::Value> {
        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let reason = match status.as_u16() {
                401 => "authentication failed".to_string(),
                429 => "rate limit exceeded".to_string(),
                503 => "service unavailable".to_string(),
                _ => status.to_string(),
            };
            return Err(OrchestratorError::Http { message: reason });
        }

        Ok(response.json().await?)
    }

    /// Run a chat completion and return the first message content
    async fn chat(&self, model: &str, system: &str, user: &str, json_mode: bool) -> OrchestratorResult<String> {
        let mut body = serde_json::json!({
            "model": model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "temperature": 0.7
        });
        if json_mode {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        let response = self.post_json(CHAT_URL, body).await?;
        let content = response
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| OrchestratorError::Http {
                message: "no content in response".to_string(),
            })?;

        if let Some(tokens) = response.pointer("/usage/total_tokens").and_then(|t| t.as_u64()) {
            debug!(model, tokens, "Chat completion finished");
        }
        Ok(content.to_string())
    }
}

/// Shape the model is asked to return
#[derive(Debug, Deserialize)]
struct DraftPayload {
    title: String,
    #[serde(default)]
    slug: String,
    body: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    faq: Vec<FaqEntry>,
}

impl From<DraftPayload> for GeneratedDraft {
    fn from(payload: DraftPayload) -> Self {
        let slug = if payload.slug.trim().is_empty() {
            slugify(&payload.title)
        } else {
            payload.slug
        };
        Self {
            title: payload.title,
            slug,
            body: payload.body,
            summary: payload.summary,
            faq: payload.faq,
        }
    }
}

const DRAFT_FORMAT: &str = "Respond with a JSON object with the keys \"title\", \"slug\", \"body\" (markdown), \
     \"summary\" (one or two sentences) and \"faq\" (an array of objects with \"question\" and \"answer\").";

fn parse_draft(content: &str) -> OrchestratorResult<GeneratedDraft> {
    let payload: DraftPayload = serde_json::from_str(content)?;
    if payload.title.trim().is_empty() || payload.body.trim().is_empty() {
        return Err(OrchestratorError::generation("model returned an empty draft"));
    }
    Ok(payload.into())
}

/// Draft generation through chat completions
#[derive(Debug, Clone)]
pub struct OpenAiContentGenerator {
    client: OpenAiClient,
    model: String,
}

impl OpenAiContentGenerator {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ContentGenerator for OpenAiContentGenerator {
    async fn generate(&self, keyword: &str, style_hint: Option<String>) -> OrchestratorResult<GeneratedDraft> {
        let system = format!("You are an SEO content writer. {DRAFT_FORMAT}");
        let mut user = format!("Write a complete, helpful article targeting the keyword \"{keyword}\".");
        if let Some(style) = style_hint {
            user.push_str(&format!(" Topic cluster / tone: {style}."));
        }

        let content = self
            .client
            .chat(&self.model, &system, &user, true)
            .await
            .map_err(|e| OrchestratorError::generation(e.to_string()))?;
        parse_draft(&content).map_err(|e| OrchestratorError::generation(e.to_string()))
    }
}

/// Improvement pass through chat completions
#[derive(Debug, Clone)]
pub struct OpenAiContentImprover {
    client: OpenAiClient,
}

impl OpenAiContentImprover {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }

    fn instruction(mode: ImprovementMode) -> &'static str {
        match mode {
            ImprovementMode::Polish => "Fix grammar and flow without changing structure or length.",
            ImprovementMode::Expand => "Expand thin sections with concrete detail and examples.",
            ImprovementMode::Rewrite => "Rewrite the article for clarity while keeping its topic and facts.",
        }
    }
}

#[async_trait]
impl ContentImprover for OpenAiContentImprover {
    async fn improve(&self, draft: &GeneratedDraft, options: &ImprovementOptions) -> OrchestratorResult<GeneratedDraft> {
        let system = format!(
            "You are an editor. {} {DRAFT_FORMAT}",
            Self::instruction(options.mode)
        );
        let user = serde_json::to_string(draft)?;

        let content = self
            .client
            .chat(&options.model, &system, &user, true)
            .await
            .map_err(|e| OrchestratorError::Improvement { message: e.to_string() })?;
        parse_draft(&content).map_err(|e| OrchestratorError::Improvement { message: e.to_string() })
    }
}

/// Featured images through the images endpoint
#[derive(Debug, Clone)]
pub struct OpenAiImageGenerator {
    client: OpenAiClient,
}

impl OpenAiImageGenerator {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate(&self, prompt: &str, model: &str, site_id: &SiteId) -> OrchestratorResult<Option<ImageAsset>> {
        let body = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "n": 1,
            "size": "1024x1024",
            "user": site_id.to_string(),
        });

        let response = self
            .client
            .post_json(IMAGES_URL, body)
            .await
            .map_err(|e| OrchestratorError::Image { message: e.to_string() })?;

        let url = response
            .pointer("/data/0/url")
            .and_then(|url| url.as_str())
            .filter(|url| !url.is_empty());
        Ok(url.map(|url| ImageAsset {
            url: url.to_string(),
            alt: prompt.to_string(),
        }))
    }
}
