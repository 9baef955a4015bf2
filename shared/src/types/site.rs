//! Sites (tenants)

use serde::{Deserialize, Serialize};

use super::{CadenceConfig, SiteId};

/// An independently branded property that content is generated for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    /// Tone/voice hint handed to the generator when a keyword has no cluster tag
    #[serde(default)]
    pub style_hint: Option<String>,
    #[serde(default)]
    pub cadence: CadenceConfig,
}

impl Site {
    pub fn new(name: impl Into<String>, cadence: CadenceConfig) -> Self {
        Self {
            id: SiteId::new(),
            name: name.into(),
            domain: None,
            style_hint: None,
            cadence,
        }
    }
}
