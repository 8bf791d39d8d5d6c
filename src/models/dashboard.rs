use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::lpj::{self, Lpj, LpjListItem};
use crate::models::periode::{PeriodRegistry, Periode};
use crate::models::pondok::{self, Pondok};
use crate::models::rab::{self, Rab, RabListItem};
use crate::models::workflow::{EligibilitySummary, StatusCounts, SubmissionKind, count_by_status, summarize};

const RECENT_LIMIT: i64 = 5;

// ---------- Types ----------

/// Overview for central admins, scoped to the current period.
#[derive(Debug, Clone, Serialize)]
pub struct PusatDashboard {
    pub periode: Option<Periode>,
    pub pondok_count: i64,
    pub pending_profiles: i64,
    pub rab: StatusCounts,
    pub lpj: StatusCounts,
    pub recent_rab: Vec<RabListItem>,
    pub recent_lpj: Vec<LpjListItem>,
}

/// Overview for one branch.
#[derive(Debug, Clone, Serialize)]
pub struct PondokDashboard {
    pub periode: Option<Periode>,
    pub pondok: Pondok,
    pub rab: Option<Rab>,
    pub lpj: Option<Lpj>,
    pub eligibility: EligibilitySummary,
}

// ---------- Queries ----------

pub async fn pusat_overview(pool: &PgPool, registry: &PeriodRegistry, now: DateTime<Utc>) -> Result<PusatDashboard, AppError> {
    let periode = registry.current_at(pool, now).await?;
    let pondok_count = pondok::count(pool).await?;
    let (_, pending_profiles) = pondok::find_paginated(pool, 1, 1, true).await?;

    let (rab_counts, lpj_counts, recent_rab, recent_lpj) = match &periode {
        Some(p) => (
            count_by_status(pool, SubmissionKind::Rab, &p.id).await?,
            count_by_status(pool, SubmissionKind::Lpj, &p.id).await?,
            rab::list_by_periode(pool, &p.id, None, 1, RECENT_LIMIT).await?.0,
            lpj::list_by_periode(pool, &p.id, None, 1, RECENT_LIMIT).await?.0,
        ),
        None => Default::default(),
    };

    Ok(PusatDashboard {
        periode,
        pondok_count,
        pending_profiles,
        rab: rab_counts,
        lpj: lpj_counts,
        recent_rab,
        recent_lpj,
    })
}

pub async fn pondok_overview(
    pool: &PgPool,
    registry: &PeriodRegistry,
    pondok_id: i64,
    now: DateTime<Utc>,
) -> Result<PondokDashboard, AppError> {
    let pondok = pondok::find_by_id(pool, pondok_id).await?.ok_or(AppError::NotFound)?;
    let periode = registry.current_at(pool, now).await?;
    let (rab, lpj) = match &periode {
        Some(p) => (
            rab::find_by_pondok_and_periode(pool, pondok_id, &p.id).await?,
            lpj::find_by_pondok_and_periode(pool, pondok_id, &p.id).await?,
        ),
        None => (None, None),
    };

    let eligibility = summarize(
        pondok.is_profile_complete(),
        periode.as_ref(),
        rab.as_ref().map(|r| r.status),
        lpj.as_ref().map(|l| l.status),
        registry.local(now),
    );

    Ok(PondokDashboard { periode, pondok, rab, lpj, eligibility })
}

/// What the branch may do right now.
pub async fn branch_eligibility(
    pool: &PgPool,
    registry: &PeriodRegistry,
    pondok_id: i64,
    now: DateTime<Utc>,
) -> Result<EligibilitySummary, AppError> {
    Ok(pondok_overview(pool, registry, pondok_id, now).await?.eligibility)
}
