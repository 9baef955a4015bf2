//! Generated content payloads exchanged with the generation services

use serde::{Deserialize, Serialize};

/// Question/answer pair rendered as an FAQ block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Article draft produced by the content generator (and optionally improved)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDraft {
    pub title: String,
    pub slug: String,
    pub body: String,
    pub summary: String,
    #[serde(default)]
    pub faq: Vec<FaqEntry>,
}

/// Image returned by the image generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub url: String,
    pub alt: String,
}

/// Lowercase, ASCII-alphanumeric slug with single dashes
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
