use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::workflow::{self, ReviewAction, ReviewTarget, SubmissionKind};
use crate::notifications;

/// Central admin accepts a submitted document.
pub async fn approve(
    pool: &PgPool,
    reviewer_id: i64,
    kind: SubmissionKind,
    id: i64,
    now: DateTime<Utc>,
) -> Result<ReviewTarget, AppError> {
    review(pool, reviewer_id, kind, id, ReviewAction::Approve, now).await
}

/// Central admin sends a submitted document back with a message.
pub async fn request_revision(
    pool: &PgPool,
    reviewer_id: i64,
    kind: SubmissionKind,
    id: i64,
    message: &str,
    now: DateTime<Utc>,
) -> Result<ReviewTarget, AppError> {
    review(pool, reviewer_id, kind, id, ReviewAction::RequestRevision(message.to_string()), now).await
}

async fn review(
    pool: &PgPool,
    reviewer_id: i64,
    kind: SubmissionKind,
    id: i64,
    action: ReviewAction,
    now: DateTime<Utc>,
) -> Result<ReviewTarget, AppError> {
    let target = workflow::find_review_target(pool, kind, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let next = target.state.apply(&action, now)?;

    let mut conn = pool.acquire().await?;
    if !workflow::save_review_state(&mut conn, kind, id, target.state.status, &next).await? {
        return Err(AppError::Conflict(format!("{kind} {id} changed status during review")));
    }
    drop(conn);

    log::info!("{kind} {id} reviewed by user {reviewer_id}: {} -> {}", target.state.status, next.status);

    let entity_id = id.to_string();
    notifications::notify_pondok_users(
        pool,
        target.pondok_id,
        kind.into(),
        &entity_id,
        &notifications::reviewed_message(kind, &target.periode_id, next.status),
    )
    .await;

    let verb = match action {
        ReviewAction::Approve => "approved",
        ReviewAction::RequestRevision(_) => "revision_requested",
        ReviewAction::Resubmit => "resubmitted",
    };
    let details = serde_json::json!({
        "pondok_id": target.pondok_id,
        "periode_id": target.periode_id,
        "from": target.state.status,
        "to": next.status,
        "revision_message": next.revision_message,
    });
    let _ = crate::audit::log(
        pool,
        reviewer_id,
        &format!("{}.{verb}", kind.as_str()),
        kind.as_str(),
        &entity_id,
        details,
    )
    .await;

    Ok(ReviewTarget { state: next, ..target })
}
