use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::validated;
use crate::errors::AppError;
use crate::models::periode::{self, PeriodRegistry};
use crate::models::rab::{self, RabDetail, RabForm};
use crate::models::workflow::{
    self, ReviewAction, ReviewState, SubmissionKind, check_create_rab, check_edit_submission,
};
use crate::models::pondok;
use crate::notifications;

/// Submit a new RAB for the branch's current period.
pub async fn create(
    pool: &PgPool,
    registry: &PeriodRegistry,
    user_id: i64,
    pondok_id: i64,
    form: &RabForm,
    now: DateTime<Utc>,
) -> Result<RabDetail, AppError> {
    let pondok = pondok::find_by_id(pool, pondok_id).await?.ok_or(AppError::NotFound)?;
    let current = registry.current_at(pool, now).await?;
    let existing = match &current {
        Some(p) => workflow::status_for(pool, SubmissionKind::Rab, pondok_id, &p.id).await?,
        None => None,
    };

    let period = check_create_rab(pondok.is_profile_complete(), current.as_ref(), existing, registry.local(now))?;
    validated(form.validate())?;

    let state = ReviewState::submitted(now);
    let mut tx = pool.begin().await?;
    let id = rab::insert(&mut tx, pondok_id, &period.id, form, &state).await?;
    tx.commit().await?;

    log::info!("RAB {id} submitted by pondok {pondok_id} for period {}", period.id);

    let entity_id = id.to_string();
    notifications::notify_central_admins(
        pool,
        SubmissionKind::Rab.into(),
        &entity_id,
        &notifications::submitted_message(SubmissionKind::Rab, &pondok.name, &period.id, false),
    )
    .await;

    let details = serde_json::json!({
        "pondok_id": pondok_id,
        "periode_id": period.id,
        "total_pengeluaran": form.total_pengeluaran(),
        "items": form.items.len(),
        "summary": format!("RAB submitted for period {}", period.id),
    });
    let _ = crate::audit::log(pool, user_id, "rab.submitted", "rab", &entity_id, details).await;

    rab::find_detail(pool, id).await?.ok_or(AppError::NotFound)
}

/// Resubmit a RAB that a central admin sent back for revision.
pub async fn resubmit(
    pool: &PgPool,
    registry: &PeriodRegistry,
    user_id: i64,
    pondok_id: i64,
    rab_id: i64,
    form: &RabForm,
    now: DateTime<Utc>,
) -> Result<RabDetail, AppError> {
    let existing = rab::find_by_id(pool, rab_id)
        .await?
        .filter(|r| r.pondok_id == pondok_id)
        .ok_or(AppError::NotFound)?;
    let period = periode::find_by_id(pool, &existing.periode_id)
        .await?
        .ok_or(AppError::NotFound)?;

    check_edit_submission(SubmissionKind::Rab, existing.status, &period, registry.local(now))?;
    validated(form.validate())?;
    let next = existing.review_state().apply(&ReviewAction::Resubmit, now)?;

    let mut tx = pool.begin().await?;
    if !rab::resubmit(&mut tx, rab_id, form, &next).await? {
        return Err(AppError::Conflict("RAB is no longer awaiting revision".to_string()));
    }
    tx.commit().await?;

    log::info!("RAB {rab_id} resubmitted by pondok {pondok_id}");

    let detail = rab::find_detail(pool, rab_id).await?.ok_or(AppError::NotFound)?;
    let entity_id = rab_id.to_string();
    notifications::notify_central_admins(
        pool,
        SubmissionKind::Rab.into(),
        &entity_id,
        &notifications::submitted_message(SubmissionKind::Rab, &detail.pondok_name, &period.id, true),
    )
    .await;

    let details = serde_json::json!({
        "pondok_id": pondok_id,
        "periode_id": period.id,
        "total_pengeluaran": form.total_pengeluaran(),
        "summary": "RAB resubmitted after revision",
    });
    let _ = crate::audit::log(pool, user_id, "rab.resubmitted", "rab", &entity_id, details).await;

    Ok(detail)
}
