use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::workflow::SubmissionKind;

/// An administrator-defined submission period (one per calendar month).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Periode {
    pub id: String,
    pub year: i32,
    pub month: i32,
    pub rab_start: NaiveDate,
    pub rab_end: NaiveDate,
    pub lpj_start: NaiveDate,
    pub lpj_end: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// An inclusive date range: open from the first instant of `start` through
/// 23:59:59.999 of `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn opens_at(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    pub fn closes_at(&self) -> NaiveDateTime {
        // 23:59:59.999 is always a valid time of day.
        self.end.and_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN))
    }

    pub fn contains(&self, now: NaiveDateTime) -> bool {
        now >= self.opens_at() && now <= self.closes_at()
    }
}

impl Periode {
    pub fn window(&self, kind: SubmissionKind) -> DateWindow {
        match kind {
            SubmissionKind::Rab => DateWindow { start: self.rab_start, end: self.rab_end },
            SubmissionKind::Lpj => DateWindow { start: self.lpj_start, end: self.lpj_end },
        }
    }

    /// `now` is local wall-clock time in the service's configured offset.
    pub fn is_within_window(&self, kind: SubmissionKind, now: NaiveDateTime) -> bool {
        self.window(kind).contains(now)
    }
}

/// Period id convention: `YYYYMM`.
pub fn periode_id(year: i32, month: u32) -> String {
    format!("{year}{month:02}")
}

/// Input for creating or editing a period.
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodeForm {
    pub year: i32,
    pub month: i32,
    pub rab_start: NaiveDate,
    pub rab_end: NaiveDate,
    pub lpj_start: NaiveDate,
    pub lpj_end: NaiveDate,
}

impl PeriodeForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(2020..=2100).contains(&self.year) {
            errors.push("Year must be between 2020 and 2100".to_string());
        }
        if !(1..=12).contains(&self.month) {
            errors.push("Month must be between 1 and 12".to_string());
        }
        if self.rab_end < self.rab_start {
            errors.push("RAB end date must not precede its start date".to_string());
        }
        if self.lpj_end < self.lpj_start {
            errors.push("LPJ end date must not precede its start date".to_string());
        }
        errors
    }

    pub fn id(&self) -> String {
        periode_id(self.year, self.month.clamp(1, 12) as u32)
    }
}

/// Window edits for an existing period; year and month are fixed by its id.
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodeWindowsForm {
    pub rab_start: NaiveDate,
    pub rab_end: NaiveDate,
    pub lpj_start: NaiveDate,
    pub lpj_end: NaiveDate,
}

impl PeriodeWindowsForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.rab_end < self.rab_start {
            errors.push("RAB end date must not precede its start date".to_string());
        }
        if self.lpj_end < self.lpj_start {
            errors.push("LPJ end date must not precede its start date".to_string());
        }
        errors
    }
}

/// How the "current" period is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrentPeriodPolicy {
    /// The period whose id is `YYYYMM` of today's local date; none if it does not exist.
    #[default]
    Calendar,
    /// The most recently created period.
    Latest,
}

impl FromStr for CurrentPeriodPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calendar" => Ok(CurrentPeriodPolicy::Calendar),
            "latest" => Ok(CurrentPeriodPolicy::Latest),
            other => Err(format!("Unknown current period policy '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Periode {
        Periode {
            id: "202501".into(),
            year: 2025,
            month: 1,
            rab_start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            rab_end: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            lpj_start: NaiveDate::from_ymd_opt(2025, 1, 25).unwrap(),
            lpj_end: NaiveDate::from_ymd_opt(2025, 2, 5).unwrap(),
            created_at: Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap(),
        }
    }

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_milli_opt(h, mi, s, ms)
            .unwrap()
    }

    #[test]
    fn end_of_window_is_inclusive_through_the_last_millisecond() {
        let p = sample();
        assert!(p.is_within_window(SubmissionKind::Rab, dt(2025, 1, 10, 23, 59, 0, 0)));
        assert!(p.is_within_window(SubmissionKind::Rab, dt(2025, 1, 10, 23, 59, 59, 999)));
        assert!(!p.is_within_window(SubmissionKind::Rab, dt(2025, 1, 11, 0, 0, 0, 0)));
        assert!(!p.is_within_window(SubmissionKind::Rab, dt(2025, 1, 11, 0, 0, 1, 0)));
    }

    #[test]
    fn start_of_window_is_inclusive() {
        let p = sample();
        assert!(p.is_within_window(SubmissionKind::Rab, dt(2025, 1, 1, 0, 0, 0, 0)));
        assert!(!p.is_within_window(SubmissionKind::Rab, dt(2024, 12, 31, 23, 59, 59, 999)));
    }

    #[test]
    fn lpj_window_may_cross_month_boundary() {
        let p = sample();
        assert!(p.is_within_window(SubmissionKind::Lpj, dt(2025, 2, 5, 12, 0, 0, 0)));
        assert!(!p.is_within_window(SubmissionKind::Lpj, dt(2025, 1, 10, 12, 0, 0, 0)));
    }

    #[test]
    fn single_day_window_is_allowed() {
        let form = PeriodeForm {
            year: 2025,
            month: 3,
            rab_start: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            rab_end: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            lpj_start: NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
            lpj_end: NaiveDate::from_ymd_opt(2025, 3, 19).unwrap(),
        };
        let errors = form.validate();
        assert_eq!(errors, vec!["LPJ end date must not precede its start date".to_string()]);
        assert_eq!(form.id(), "202503");
    }

    #[test]
    fn year_and_month_bounds() {
        let form = PeriodeForm {
            year: 2019,
            month: 13,
            rab_start: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            rab_end: NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
            lpj_start: NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
            lpj_end: NaiveDate::from_ymd_opt(2025, 3, 21).unwrap(),
        };
        assert_eq!(form.validate().len(), 2);
    }

    #[test]
    fn policy_parsing() {
        assert_eq!("Calendar".parse::<CurrentPeriodPolicy>().unwrap(), CurrentPeriodPolicy::Calendar);
        assert_eq!("latest".parse::<CurrentPeriodPolicy>().unwrap(), CurrentPeriodPolicy::Latest);
        assert!("newest".parse::<CurrentPeriodPolicy>().is_err());
        assert_eq!(periode_id(2025, 7), "202507");
    }
}
