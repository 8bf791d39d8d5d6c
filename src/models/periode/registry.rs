use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use sqlx::PgPool;

use super::queries;
use super::types::{CurrentPeriodPolicy, Periode, periode_id};
use crate::errors::AppError;

/// Resolves the current period and converts instants to the service's local time.
///
/// Built once at startup and shared through `web::Data`.
#[derive(Debug, Clone, Copy)]
pub struct PeriodRegistry {
    policy: CurrentPeriodPolicy,
    offset: FixedOffset,
}

impl PeriodRegistry {
    pub fn new(policy: CurrentPeriodPolicy, offset: FixedOffset) -> Self {
        PeriodRegistry { policy, offset }
    }

    pub fn policy(&self) -> CurrentPeriodPolicy {
        self.policy
    }

    /// Local wall-clock time of an instant; windows are compared against this.
    pub fn local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local(instant).date()
    }

    /// Id the calendar policy would pick at `instant`.
    pub fn calendar_period_id(&self, instant: DateTime<Utc>) -> String {
        let today = self.local_date(instant);
        periode_id(today.year(), today.month())
    }

    /// The active period at `instant`, or `None` when no period qualifies.
    pub async fn current_at(
        &self,
        pool: &PgPool,
        instant: DateTime<Utc>,
    ) -> Result<Option<Periode>, AppError> {
        match self.policy {
            CurrentPeriodPolicy::Calendar => {
                queries::find_by_id(pool, &self.calendar_period_id(instant)).await
            }
            CurrentPeriodPolicy::Latest => queries::find_latest(pool).await,
        }
    }

    pub async fn current(&self, pool: &PgPool) -> Result<Option<Periode>, AppError> {
        self.current_at(pool, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn local_time_uses_configured_offset() {
        let wib = FixedOffset::east_opt(7 * 3600).unwrap();
        let registry = PeriodRegistry::new(CurrentPeriodPolicy::Calendar, wib);
        // 2025-01-31 18:30 UTC is already February 1st in WIB.
        let instant = Utc.with_ymd_and_hms(2025, 1, 31, 18, 30, 0).unwrap();
        assert_eq!(registry.calendar_period_id(instant), "202502");
        assert_eq!(
            registry.local(instant),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap().and_hms_opt(1, 30, 0).unwrap()
        );

        let utc = PeriodRegistry::new(CurrentPeriodPolicy::Latest, FixedOffset::east_opt(0).unwrap());
        assert_eq!(utc.calendar_period_id(instant), "202501");
        assert_eq!(utc.policy(), CurrentPeriodPolicy::Latest);
    }
}
