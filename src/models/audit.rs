use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: i64,
    pub user_email: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

const SELECT_AUDIT_DISPLAY: &str = "\
    SELECT a.id, a.user_id, COALESCE(u.email, 'unknown') AS user_email, a.action, \
           a.target_type, a.target_id, a.details, a.created_at \
    FROM audit_log a \
    LEFT JOIN users u ON u.id = a.user_id";

/// Find audit entries with pagination and optional filters, newest first.
pub async fn find_paginated(
    pool: &PgPool,
    page: i64,
    per_page: i64,
    action_filter: Option<&str>,
    target_type_filter: Option<&str>,
) -> Result<(Vec<AuditEntry>, i64), AppError> {
    let page = page.max(1);
    let per_page = per_page.clamp(1, 100);
    let offset = (page - 1) * per_page;
    let action = action_filter.filter(|a| !a.is_empty() && *a != "all");
    let target_type = target_type_filter.filter(|t| !t.is_empty() && *t != "all");

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_log a \
         WHERE ($1::TEXT IS NULL OR a.action = $1) AND ($2::TEXT IS NULL OR a.target_type = $2)",
    )
    .bind(action)
    .bind(target_type)
    .fetch_one(pool)
    .await?;

    let entries = sqlx::query_as::<_, AuditEntry>(&format!(
        "{SELECT_AUDIT_DISPLAY} \
         WHERE ($1::TEXT IS NULL OR a.action = $1) AND ($2::TEXT IS NULL OR a.target_type = $2) \
         ORDER BY a.created_at DESC, a.id DESC LIMIT $3 OFFSET $4"
    ))
    .bind(action)
    .bind(target_type)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((entries, total))
}

/// Entries touching one target, newest first.
pub async fn find_for_target(
    pool: &PgPool,
    target_type: &str,
    target_id: &str,
) -> Result<Vec<AuditEntry>, AppError> {
    let entries = sqlx::query_as::<_, AuditEntry>(&format!(
        "{SELECT_AUDIT_DISPLAY} WHERE a.target_type = $1 AND a.target_id = $2 \
         ORDER BY a.created_at DESC, a.id DESC"
    ))
    .bind(target_type)
    .bind(target_id)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}
