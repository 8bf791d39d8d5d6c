use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use super::transitions::ReviewState;
use super::types::*;
use crate::errors::AppError;

fn table(kind: SubmissionKind) -> &'static str {
    match kind {
        SubmissionKind::Rab => "rab",
        SubmissionKind::Lpj => "lpj",
    }
}

/// Parse a status column; an unknown value means the row is corrupt.
pub fn parse_status(raw: &str) -> Result<SubmissionStatus, AppError> {
    raw.parse::<SubmissionStatus>()
        .map_err(|e| AppError::Db(sqlx::Error::Decode(e.into())))
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    pondok_id: i64,
    periode_id: String,
    status: String,
    submitted_at: Option<DateTime<Utc>>,
    accepted_at: Option<DateTime<Utc>>,
    revision_message: Option<String>,
}

/// The identity and review state of one RAB or LPJ.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewTarget {
    pub kind: SubmissionKind,
    pub id: i64,
    pub pondok_id: i64,
    pub periode_id: String,
    #[serde(flatten)]
    pub state: ReviewState,
}

pub async fn find_review_target(
    pool: &PgPool,
    kind: SubmissionKind,
    id: i64,
) -> Result<Option<ReviewTarget>, AppError> {
    let sql = format!(
        "SELECT id, pondok_id, periode_id, status, submitted_at, accepted_at, revision_message \
         FROM {} WHERE id = $1",
        table(kind)
    );
    let row = sqlx::query_as::<_, ReviewRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(r) => Ok(Some(ReviewTarget {
            kind,
            id: r.id,
            pondok_id: r.pondok_id,
            periode_id: r.periode_id,
            state: ReviewState {
                status: parse_status(&r.status)?,
                submitted_at: r.submitted_at,
                accepted_at: r.accepted_at,
                revision_message: r.revision_message,
            },
        })),
        None => Ok(None),
    }
}

/// Persist `next` only while the record is still in `expected`.
/// Returns false when the record has moved on in the meantime.
pub async fn save_review_state(
    conn: &mut PgConnection,
    kind: SubmissionKind,
    id: i64,
    expected: SubmissionStatus,
    next: &ReviewState,
) -> Result<bool, AppError> {
    let sql = format!(
        "UPDATE {} SET status = $1, submitted_at = $2, accepted_at = $3, revision_message = $4 \
         WHERE id = $5 AND status = $6",
        table(kind)
    );
    let result = sqlx::query(&sql)
        .bind(next.status.as_str())
        .bind(next.submitted_at)
        .bind(next.accepted_at)
        .bind(&next.revision_message)
        .bind(id)
        .bind(expected.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Status of a branch's record for a period; `None` is the implicit "belum".
pub async fn status_for(
    pool: &PgPool,
    kind: SubmissionKind,
    pondok_id: i64,
    periode_id: &str,
) -> Result<Option<SubmissionStatus>, AppError> {
    let sql = format!(
        "SELECT status FROM {} WHERE pondok_id = $1 AND periode_id = $2",
        table(kind)
    );
    let raw: Option<String> = sqlx::query_scalar(&sql)
        .bind(pondok_id)
        .bind(periode_id)
        .fetch_optional(pool)
        .await?;
    raw.as_deref().map(parse_status).transpose()
}

/// Per-status totals of one kind within a period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: i64,
    pub diajukan: i64,
    pub revisi: i64,
    pub diterima: i64,
}

pub async fn count_by_status(
    pool: &PgPool,
    kind: SubmissionKind,
    periode_id: &str,
) -> Result<StatusCounts, AppError> {
    let sql = format!(
        "SELECT status, COUNT(*) FROM {} WHERE periode_id = $1 GROUP BY status",
        table(kind)
    );
    let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
        .bind(periode_id)
        .fetch_all(pool)
        .await?;

    let mut counts = StatusCounts::default();
    for (status, n) in rows {
        match parse_status(&status)? {
            SubmissionStatus::Diajukan => counts.diajukan = n,
            SubmissionStatus::Revisi => counts.revisi = n,
            SubmissionStatus::Diterima => counts.diterima = n,
        }
        counts.total += n;
    }
    Ok(counts)
}
