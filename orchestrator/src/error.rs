//! Orchestrator-specific error types

use shared::{ArticleId, KeywordId, SharedError, SiteId};
use thiserror::Error;

use crate::core::QuotaDecision;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Content generation failed: {message}")]
    Generation { message: String },

    #[error("Content improvement failed: {message}")]
    Improvement { message: String },

    #[error("Image generation failed: {message}")]
    Image { message: String },

    #[error("Failed to persist article: {message}")]
    Persistence { message: String },

    #[error("Keyword allocation failed for site {site_id}: {message}")]
    Allocation { site_id: SiteId, message: String },

    #[error("Store operation failed: {operation}: {message}")]
    Store { operation: String, message: String },

    #[error("Quota exceeded for site {site_id}: {decision}")]
    QuotaExceeded { site_id: SiteId, decision: QuotaDecision },

    #[error("No keyword available for site {site_id}")]
    NoKeywordAvailable { site_id: SiteId },

    #[error("Site not found: {site_id}")]
    SiteNotFound { site_id: SiteId },

    #[error("Keyword not found: {keyword_id}")]
    KeywordNotFound { keyword_id: KeywordId },

    #[error("Article not found: {article_id}")]
    ArticleNotFound { article_id: ArticleId },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("HTTP request failed: {message}")]
    Http { message: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl OrchestratorError {
    pub fn config(field: impl Into<String>) -> Self {
        Self::ConfigurationError { field: field.into() }
    }

    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation { message: message.into() }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence { message: message.into() }
    }
}

impl From<reqwest::Error> for OrchestratorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http { message: err.to_string() }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
