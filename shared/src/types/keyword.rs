//! Keyword pool entries and their lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{KeywordId, SiteId};

/// Lifecycle status of a keyword
///
/// `Pending -> Generating` is the exclusive claim taken by a pipeline run. A run
/// always resolves the claim to `Generated`/`Published` on success or back to
/// `Pending` on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordStatus {
    Pending,
    Generating,
    Generated,
    Published,
    Archived,
}

impl KeywordStatus {
    /// Only pending keywords may be claimed
    pub fn is_claimable(&self) -> bool {
        matches!(self, KeywordStatus::Pending)
    }

    /// Whether this status is a valid resting state once a pipeline has returned
    pub fn is_terminal_for_run(&self) -> bool {
        match self {
            KeywordStatus::Generating => false,
            KeywordStatus::Pending
            | KeywordStatus::Generated
            | KeywordStatus::Published
            | KeywordStatus::Archived => true,
        }
    }
}

impl fmt::Display for KeywordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeywordStatus::Pending => "pending",
            KeywordStatus::Generating => "generating",
            KeywordStatus::Generated => "generated",
            KeywordStatus::Published => "published",
            KeywordStatus::Archived => "archived",
        };
        f.write_str(s)
    }
}

/// A keyword in the pool, either scoped to one site or global
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: KeywordId,
    /// `None` means the keyword is global and usable by any site
    pub site_id: Option<SiteId>,
    pub text: String,
    pub status: KeywordStatus,
    /// Higher is preferred
    pub priority: i32,
    pub cluster_tag: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Keyword {
    /// Whether the given site may consume this keyword
    pub fn is_usable_by(&self, site_id: &SiteId) -> bool {
        match &self.site_id {
            Some(owner) => owner == site_id,
            None => true,
        }
    }
}

/// Keyword import payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewKeyword {
    pub text: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub cluster_tag: Option<String>,
}

impl NewKeyword {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority: 0,
            cluster_tag: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster_tag = Some(cluster.into());
        self
    }
}
