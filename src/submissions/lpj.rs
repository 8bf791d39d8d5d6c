use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::validated;
use crate::errors::AppError;
use crate::models::lpj::{self, LpjDetail, LpjForm};
use crate::models::periode::{self, PeriodRegistry};
use crate::models::pondok;
use crate::models::rab;
use crate::models::workflow::{
    self, Ineligible, ReviewAction, ReviewState, SubmissionKind, check_create_lpj,
    check_edit_submission,
};
use crate::notifications;

/// Submit the LPJ for the current period. Requires the period's RAB to be accepted;
/// the opening balance is taken from that RAB's closing balance.
pub async fn create(
    pool: &PgPool,
    registry: &PeriodRegistry,
    user_id: i64,
    pondok_id: i64,
    form: &LpjForm,
    now: DateTime<Utc>,
) -> Result<LpjDetail, AppError> {
    let pondok = pondok::find_by_id(pool, pondok_id).await?.ok_or(AppError::NotFound)?;
    let current = registry.current_at(pool, now).await?;
    let (paired_rab, existing) = match &current {
        Some(p) => (
            rab::find_by_pondok_and_periode(pool, pondok_id, &p.id).await?,
            workflow::status_for(pool, SubmissionKind::Lpj, pondok_id, &p.id).await?,
        ),
        None => (None, None),
    };

    let period = check_create_lpj(
        pondok.is_profile_complete(),
        current.as_ref(),
        paired_rab.as_ref().map(|r| r.status),
        existing,
        registry.local(now),
    )?;
    let paired_rab = paired_rab.ok_or(Ineligible::RabNotAccepted { rab_status: None })?;
    validated(form.validate())?;

    let ledger = form.ledger(paired_rab.closing_balance()?)?;
    let state = ReviewState::submitted(now);
    let mut tx = pool.begin().await?;
    let id = lpj::insert(&mut tx, pondok_id, &period.id, paired_rab.id, &ledger, form, &state).await?;
    tx.commit().await?;

    log::info!("LPJ {id} submitted by pondok {pondok_id} for period {}", period.id);

    let entity_id = id.to_string();
    notifications::notify_central_admins(
        pool,
        SubmissionKind::Lpj.into(),
        &entity_id,
        &notifications::submitted_message(SubmissionKind::Lpj, &pondok.name, &period.id, false),
    )
    .await;

    let details = serde_json::json!({
        "pondok_id": pondok_id,
        "periode_id": period.id,
        "rab_id": paired_rab.id,
        "saldo_awal": ledger.saldo_awal(),
        "sisa_saldo": ledger.sisa_saldo(),
        "summary": format!("LPJ submitted for period {}", period.id),
    });
    let _ = crate::audit::log(pool, user_id, "lpj.submitted", "lpj", &entity_id, details).await;

    lpj::find_detail(pool, id).await?.ok_or(AppError::NotFound)
}

/// Resubmit an LPJ in revision. The locked opening balance is kept.
pub async fn resubmit(
    pool: &PgPool,
    registry: &PeriodRegistry,
    user_id: i64,
    pondok_id: i64,
    lpj_id: i64,
    form: &LpjForm,
    now: DateTime<Utc>,
) -> Result<LpjDetail, AppError> {
    let existing = lpj::find_by_id(pool, lpj_id)
        .await?
        .filter(|l| l.pondok_id == pondok_id)
        .ok_or(AppError::NotFound)?;
    let period = periode::find_by_id(pool, &existing.periode_id)
        .await?
        .ok_or(AppError::NotFound)?;

    check_edit_submission(SubmissionKind::Lpj, existing.status, &period, registry.local(now))?;
    validated(form.validate())?;
    let next = existing.review_state().apply(&ReviewAction::Resubmit, now)?;
    let ledger = form.ledger(existing.saldo_awal)?;

    let mut tx = pool.begin().await?;
    if !lpj::resubmit(&mut tx, lpj_id, &ledger, form, &next).await? {
        return Err(AppError::Conflict("LPJ is no longer awaiting revision".to_string()));
    }
    tx.commit().await?;

    log::info!("LPJ {lpj_id} resubmitted by pondok {pondok_id}");

    let detail = lpj::find_detail(pool, lpj_id).await?.ok_or(AppError::NotFound)?;
    let entity_id = lpj_id.to_string();
    notifications::notify_central_admins(
        pool,
        SubmissionKind::Lpj.into(),
        &entity_id,
        &notifications::submitted_message(SubmissionKind::Lpj, &detail.pondok_name, &period.id, true),
    )
    .await;

    let details = serde_json::json!({
        "pondok_id": pondok_id,
        "periode_id": period.id,
        "sisa_saldo": ledger.sisa_saldo(),
        "summary": "LPJ resubmitted after revision",
    });
    let _ = crate::audit::log(pool, user_id, "lpj.resubmitted", "lpj", &entity_id, details).await;

    Ok(detail)
}
