//! Quota gate: decides whether a site may generate another article right now
//!
//! Pure decision logic over caller-supplied counts. The same gate serves both
//! scheduled runs (cadence window enforced) and manual runs (window bypassed,
//! numeric caps still enforced); callers pick with [`CadenceWindow`].

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveTime, Offset, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use shared::CadenceConfig;
use std::fmt;

/// Whether the weekday/hour window applies to this call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CadenceWindow {
    /// Scheduled runs: weekday and hour must be allowed
    Enforce,
    /// Manual runs: skip the weekday/hour check, keep the caps
    Bypass,
}

/// Outcome of a gate evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotaDecision {
    Eligible,
    Disabled,
    OutsideWindow,
    DailyCapReached,
    WeeklyCapReached,
}

impl QuotaDecision {
    pub fn is_eligible(&self) -> bool {
        matches!(self, QuotaDecision::Eligible)
    }
}

impl fmt::Display for QuotaDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuotaDecision::Eligible => "eligible",
            QuotaDecision::Disabled => "cadence disabled",
            QuotaDecision::OutsideWindow => "outside allowed weekday/hour window",
            QuotaDecision::DailyCapReached => "daily limit reached",
            QuotaDecision::WeeklyCapReached => "weekly limit reached",
        };
        f.write_str(s)
    }
}

/// Articles already created in the current day and ISO week
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaCounts {
    pub today: u32,
    pub this_week: u32,
}

/// Site-local period boundaries, expressed as UTC instants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodStarts {
    /// Local midnight of the current day
    pub day_start: DateTime<Utc>,
    /// Local midnight of the Monday starting the current ISO week
    pub week_start: DateTime<Utc>,
}

impl PeriodStarts {
    pub fn for_instant(now: DateTime<Utc>, utc_offset_minutes: i32) -> Self {
        let offset = site_offset(utc_offset_minutes);
        let local = now.with_timezone(&offset);
        let today = local.date_naive();
        let monday = today - Days::new(u64::from(local.weekday().num_days_from_monday()));

        let to_utc = |date: chrono::NaiveDate| {
            let local_midnight = date.and_time(NaiveTime::default());
            Utc.from_utc_datetime(&(local_midnight - chrono::Duration::seconds(i64::from(offset.local_minus_utc()))))
        };

        Self {
            day_start: to_utc(today),
            week_start: to_utc(monday),
        }
    }
}

/// Fixed offset for a site; out-of-range offsets fall back to UTC
fn site_offset(utc_offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

/// Site-local weekday (0 = Sunday) and hour for an instant
pub fn local_weekday_and_hour(now: DateTime<Utc>, utc_offset_minutes: i32) -> (u8, u8) {
    let local = now.with_timezone(&site_offset(utc_offset_minutes));
    (local.weekday().num_days_from_sunday() as u8, local.hour() as u8)
}

/// Stateless quota gate
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotaGate;

impl QuotaGate {
    /// Evaluate the gate and report why a site is blocked
    pub fn evaluate(
        cadence: &CadenceConfig,
        counts: QuotaCounts,
        now: DateTime<Utc>,
        window: CadenceWindow,
    ) -> QuotaDecision {
        if !cadence.enabled {
            return QuotaDecision::Disabled;
        }

        if window == CadenceWindow::Enforce {
            let (weekday, hour) = local_weekday_and_hour(now, cadence.utc_offset_minutes);
            if !cadence.allowed_weekdays.contains(&weekday) || !cadence.allowed_hours.contains(&hour) {
                return QuotaDecision::OutsideWindow;
            }
        }

        if counts.today >= cadence.max_per_day {
            return QuotaDecision::DailyCapReached;
        }
        if counts.this_week >= cadence.max_per_week {
            return QuotaDecision::WeeklyCapReached;
        }

        QuotaDecision::Eligible
    }

    pub fn is_eligible(
        cadence: &CadenceConfig,
        counts: QuotaCounts,
        now: DateTime<Utc>,
        window: CadenceWindow,
    ) -> bool {
        Self::evaluate(cadence, counts, now, window).is_eligible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cadence(max_per_day: u32, max_per_week: u32) -> CadenceConfig {
        CadenceConfig {
            max_per_day,
            max_per_week,
            ..CadenceConfig::default()
        }
    }

    // 2024-06-05 is a Wednesday
    fn wednesday_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap()
    }

    fn counts(today: u32, this_week: u32) -> QuotaCounts {
        QuotaCounts { today, this_week }
    }

    #[test]
    fn test_daily_cap_blocks_at_and_above_limit() {
        let cadence = cadence(2, 10);
        for today in 2..6 {
            assert_eq!(
                QuotaGate::evaluate(&cadence, counts(today, today), wednesday_noon(), CadenceWindow::Enforce),
                QuotaDecision::DailyCapReached
            );
        }
    }

    #[test]
    fn test_under_caps_inside_window_is_eligible() {
        let cadence = cadence(3, 10);
        for today in 0..3 {
            for week in today..10 {
                assert!(QuotaGate::is_eligible(
                    &cadence,
                    counts(today, week),
                    wednesday_noon(),
                    CadenceWindow::Enforce
                ));
            }
        }
    }

    #[test]
    fn test_weekly_cap_blocks() {
        let cadence = cadence(5, 4);
        assert_eq!(
            QuotaGate::evaluate(&cadence, counts(0, 4), wednesday_noon(), CadenceWindow::Bypass),
            QuotaDecision::WeeklyCapReached
        );
    }

    #[test]
    fn test_disabled_cadence_blocks_even_when_bypassing_window() {
        let cadence = CadenceConfig {
            enabled: false,
            ..CadenceConfig::default()
        };
        assert_eq!(
            QuotaGate::evaluate(&cadence, counts(0, 0), wednesday_noon(), CadenceWindow::Bypass),
            QuotaDecision::Disabled
        );
    }

    #[test]
    fn test_weekday_window_only_applies_when_enforced() {
        let cadence = CadenceConfig {
            // Monday and Tuesday only
            allowed_weekdays: [1, 2].into_iter().collect(),
            ..cadence(2, 10)
        };

        assert_eq!(
            QuotaGate::evaluate(&cadence, counts(0, 0), wednesday_noon(), CadenceWindow::Enforce),
            QuotaDecision::OutsideWindow
        );
        assert!(QuotaGate::is_eligible(
            &cadence,
            counts(0, 0),
            wednesday_noon(),
            CadenceWindow::Bypass
        ));
    }

    #[test]
    fn test_manual_bypass_still_honors_daily_cap() {
        let cadence = CadenceConfig {
            allowed_weekdays: Default::default(),
            ..cadence(2, 10)
        };
        assert_eq!(
            QuotaGate::evaluate(&cadence, counts(2, 2), wednesday_noon(), CadenceWindow::Bypass),
            QuotaDecision::DailyCapReached
        );
    }

    #[test]
    fn test_hour_window_uses_site_local_time() {
        let cadence = CadenceConfig {
            allowed_hours: [9].into_iter().collect(),
            utc_offset_minutes: -180,
            ..cadence(2, 10)
        };
        // 12:00 UTC is 09:00 at UTC-3
        assert!(QuotaGate::is_eligible(
            &cadence,
            counts(0, 0),
            wednesday_noon(),
            CadenceWindow::Enforce
        ));

        let utc_site = CadenceConfig {
            utc_offset_minutes: 0,
            ..cadence
        };
        assert!(!QuotaGate::is_eligible(
            &utc_site,
            counts(0, 0),
            wednesday_noon(),
            CadenceWindow::Enforce
        ));
    }

    #[test]
    fn test_local_weekday_numbering_starts_on_sunday() {
        let sunday = Utc.with_ymd_and_hms(2024, 6, 9, 8, 0, 0).unwrap();
        assert_eq!(local_weekday_and_hour(sunday, 0), (0, 8));
        // Two hours east it is still Sunday, 10:00
        assert_eq!(local_weekday_and_hour(sunday, 120), (0, 10));
        // Nine hours west it is Saturday, 23:00
        assert_eq!(local_weekday_and_hour(sunday, -540), (6, 23));
    }

    #[test]
    fn test_period_starts_in_utc() {
        let starts = PeriodStarts::for_instant(wednesday_noon(), 0);
        assert_eq!(starts.day_start, Utc.with_ymd_and_hms(2024, 6, 5, 0, 0, 0).unwrap());
        assert_eq!(starts.week_start, Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_period_starts_with_offset() {
        // 01:30 UTC Monday is 21:30 Sunday at UTC-4; the local week began the previous Monday
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 1, 30, 0).unwrap();
        let starts = PeriodStarts::for_instant(now, -240);
        assert_eq!(starts.day_start, Utc.with_ymd_and_hms(2024, 6, 9, 4, 0, 0).unwrap());
        assert_eq!(starts.week_start, Utc.with_ymd_and_hms(2024, 6, 3, 4, 0, 0).unwrap());
    }
}
