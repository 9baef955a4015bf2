//! Per-site generation cadence configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::KeywordId;
use crate::errors::{SharedError, SharedResult};

/// Improvement pass flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementMode {
    /// Light copy edit, structure untouched
    Polish,
    /// Add depth and examples
    Expand,
    /// Full rewrite keeping the facts
    Rewrite,
}

impl ImprovementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImprovementMode::Polish => "polish",
            ImprovementMode::Expand => "expand",
            ImprovementMode::Rewrite => "rewrite",
        }
    }
}

impl std::str::FromStr for ImprovementMode {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polish" => Ok(ImprovementMode::Polish),
            "expand" => Ok(ImprovementMode::Expand),
            "rewrite" => Ok(ImprovementMode::Rewrite),
            _ => Err(SharedError::InvalidConfig {
                field: "improvement.mode".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Options for the content improvement pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovementOptions {
    pub model: String,
    pub mode: ImprovementMode,
}

impl ImprovementOptions {
    pub fn new(model: impl Into<String>, mode: ImprovementMode) -> Self {
        Self {
            model: model.into(),
            mode,
        }
    }
}

/// Cadence and quota configuration attached 1:1 to a site
///
/// Read-only for the duration of a run. Missing fields deserialize to the
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub enabled: bool,
    pub auto_publish: bool,
    pub max_per_day: u32,
    pub max_per_week: u32,
    /// 0 = Sunday .. 6 = Saturday
    pub allowed_weekdays: BTreeSet<u8>,
    /// 0..=23, site-local
    pub allowed_hours: BTreeSet<u8>,
    pub selected_keyword_ids: Vec<KeywordId>,
    pub improvement: Option<ImprovementOptions>,
    pub image_model: Option<String>,
    /// Offset of the site's local time from UTC
    pub utc_offset_minutes: i32,
}

impl CadenceConfig {
    /// Check value ranges. `max_per_week >= max_per_day` is left to the caller.
    pub fn validate(&self) -> SharedResult<()> {
        if self.max_per_day == 0 {
            return Err(SharedError::InvalidConfig {
                field: "max_per_day".to_string(),
                value: self.max_per_day.to_string(),
            });
        }
        if self.max_per_week == 0 {
            return Err(SharedError::InvalidConfig {
                field: "max_per_week".to_string(),
                value: self.max_per_week.to_string(),
            });
        }
        if let Some(day) = self.allowed_weekdays.iter().find(|d| **d > 6) {
            return Err(SharedError::InvalidConfig {
                field: "allowed_weekdays".to_string(),
                value: day.to_string(),
            });
        }
        if let Some(hour) = self.allowed_hours.iter().find(|h| **h > 23) {
            return Err(SharedError::InvalidConfig {
                field: "allowed_hours".to_string(),
                value: hour.to_string(),
            });
        }
        // chrono's FixedOffset accepts strictly less than one day
        if self.utc_offset_minutes.unsigned_abs() >= 24 * 60 {
            return Err(SharedError::InvalidConfig {
                field: "utc_offset_minutes".to_string(),
                value: self.utc_offset_minutes.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_publish: false,
            max_per_day: 1,
            max_per_week: 7,
            allowed_weekdays: (0..=6).collect(),
            allowed_hours: (0..=23).collect(),
            selected_keyword_ids: Vec::new(),
            improvement: None,
            image_model: None,
            utc_offset_minutes: 0,
        }
    }
}
