//! Core types used throughout the content orchestrator

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod article;
pub mod cadence;
pub mod content;
pub mod keyword;
pub mod site;

pub use article::{ActivityKind, Article, ArticleStatus, NewArticle};
pub use cadence::{CadenceConfig, ImprovementMode, ImprovementOptions};
pub use content::{slugify, FaqEntry, GeneratedDraft, ImageAsset};
pub use keyword::{Keyword, KeywordStatus, NewKeyword};
pub use site::Site;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_string(s: &str) -> Result<Self, crate::SharedError> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| crate::SharedError::InvalidUuid { input: s.to_string() })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::SharedError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_string(s)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a site (tenant)
    SiteId
);

uuid_id!(
    /// Unique identifier for a keyword in the pool
    KeywordId
);

uuid_id!(
    /// Unique identifier for a persisted article
    ArticleId
);
