use serde_json::Value;
use sqlx::PgPool;

/// Audit entries older than this are removed at startup.
pub const RETENTION_DAYS: i32 = 365;

#[derive(Debug)]
pub enum AuditError {
    DbError(sqlx::Error),
}

impl From<sqlx::Error> for AuditError {
    fn from(err: sqlx::Error) -> Self {
        AuditError::DbError(err)
    }
}

impl std::fmt::Display for AuditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditError::DbError(e) => write!(f, "Database error: {}", e),
        }
    }
}

/// Record an audit entry. Callers ignore the result: a failed audit write is
/// logged here and never fails the request.
pub async fn log(
    pool: &PgPool,
    user_id: i64,
    action: &str,
    target_type: &str,
    target_id: &str,
    details: Value,
) -> Result<(), AuditError> {
    let result = sqlx::query(
        "INSERT INTO audit_log (user_id, action, target_type, target_id, details) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(action)
    .bind(target_type)
    .bind(target_id)
    .bind(&details)
    .execute(pool)
    .await;

    if let Err(e) = result {
        log::error!("Audit write failed for {action} on {target_type} {target_id}: {e}");
        return Err(e.into());
    }
    Ok(())
}

/// Delete entries past the retention window. Returns the number removed.
pub async fn cleanup_old_entries(pool: &PgPool) -> Result<u64, AuditError> {
    let result = sqlx::query(
        "DELETE FROM audit_log WHERE created_at < NOW() - make_interval(days => $1)",
    )
    .bind(RETENTION_DAYS)
    .execute(pool)
    .await?;

    let removed = result.rows_affected();
    if removed > 0 {
        log::info!("Removed {removed} audit entries older than {RETENTION_DAYS} days");
    }
    Ok(removed)
}
