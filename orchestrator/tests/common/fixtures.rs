//! Test fixtures and data for orchestrator tests
//!
//! This module provides consistent test data and fixtures used across all test suites.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use shared::{CadenceConfig, GeneratedDraft, FaqEntry, Keyword, KeywordId, KeywordStatus, Site, SiteId};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Standard test site IDs using proper UUID format
    pub const SITE_1: &'static str = "6f1c2b8e-0d4a-4c3e-9a51-1b2f3c4d5e01";
    pub const SITE_2: &'static str = "6f1c2b8e-0d4a-4c3e-9a51-1b2f3c4d5e02";
    pub const SITE_3: &'static str = "6f1c2b8e-0d4a-4c3e-9a51-1b2f3c4d5e03";

    /// Wednesday is weekday 3 (0 = Sunday)
    pub const WEDNESDAY: u8 = 3;
    pub const MONDAY: u8 = 1;

    pub fn site_id_1() -> SiteId {
        SiteId::from_string(Self::SITE_1).unwrap()
    }

    pub fn site_id_2() -> SiteId {
        SiteId::from_string(Self::SITE_2).unwrap()
    }

    pub fn site_id_3() -> SiteId {
        SiteId::from_string(Self::SITE_3).unwrap()
    }

    /// Wednesday 2026-03-18 10:00 UTC
    pub fn wednesday_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 18, 10, 0, 0).unwrap()
    }

    /// Monday 2026-03-16 09:00 UTC, earlier in the same ISO week
    pub fn monday_same_week() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap()
    }

    /// Generous caps, every weekday and hour allowed
    pub fn open_cadence(keyword_ids: Vec<KeywordId>) -> CadenceConfig {
        CadenceConfig {
            max_per_day: 100,
            max_per_week: 500,
            selected_keyword_ids: keyword_ids,
            ..CadenceConfig::default()
        }
    }

    pub fn cadence_with_caps(keyword_ids: Vec<KeywordId>, per_day: u32, per_week: u32) -> CadenceConfig {
        CadenceConfig {
            max_per_day: per_day,
            max_per_week: per_week,
            ..Self::open_cadence(keyword_ids)
        }
    }

    pub fn cadence_on_weekdays(keyword_ids: Vec<KeywordId>, weekdays: &[u8]) -> CadenceConfig {
        CadenceConfig {
            allowed_weekdays: weekdays.iter().copied().collect::<BTreeSet<u8>>(),
            ..Self::open_cadence(keyword_ids)
        }
    }

    pub fn site(id: SiteId, name: &str, cadence: CadenceConfig) -> Site {
        Site {
            id,
            ..Site::new(name, cadence)
        }
    }

    pub fn keyword(site_id: Option<SiteId>, text: &str, priority: i32) -> Keyword {
        Keyword {
            id: KeywordId::new(),
            site_id,
            text: text.to_string(),
            status: KeywordStatus::Pending,
            priority,
            cluster_tag: None,
            created_at: Self::wednesday_morning(),
        }
    }

    /// `count` pending keywords for a site, named "<prefix> 0", "<prefix> 1", ...
    pub fn keywords(site_id: SiteId, prefix: &str, count: usize) -> Vec<Keyword> {
        (0..count)
            .map(|i| Self::keyword(Some(site_id), &format!("{prefix} {i}"), 0))
            .collect()
    }

    pub fn draft(title: &str) -> GeneratedDraft {
        GeneratedDraft {
            title: title.to_string(),
            slug: String::new(),
            body: format!("Body for {title}"),
            summary: format!("Summary for {title}"),
            faq: vec![FaqEntry {
                question: "Why?".to_string(),
                answer: "Because.".to_string(),
            }],
        }
    }

    pub fn improved_draft(title: &str) -> GeneratedDraft {
        GeneratedDraft {
            body: format!("Improved body for {title}"),
            ..Self::draft(title)
        }
    }
}
