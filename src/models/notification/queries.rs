use sqlx::PgPool;

use super::types::*;
use crate::errors::AppError;

/// How many notifications a user sees in their list.
pub const LIST_LIMIT: i64 = 50;

/// Create the same notification for every user in `user_ids`. Returns the number inserted.
pub async fn create_for_users(
    pool: &PgPool,
    user_ids: &[i64],
    topic: NotificationTopic,
    entity_id: Option<&str>,
    message: &str,
) -> Result<u64, AppError> {
    if user_ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        "INSERT INTO notifikasi (user_id, type, entity_id, message) \
         SELECT u, $2, $3, $4 FROM UNNEST($1::BIGINT[]) AS u",
    )
    .bind(user_ids)
    .bind(topic.as_str())
    .bind(entity_id)
    .bind(message)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Latest notifications for a user, newest first.
pub async fn find_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Notification>, AppError> {
    let rows = sqlx::query_as::<_, Notification>(
        "SELECT id, user_id, type, entity_id, message, is_read, created_at FROM notifikasi \
         WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(LIST_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count_unread(pool: &PgPool, user_id: i64) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifikasi WHERE user_id = $1 AND is_read = FALSE",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Mark one of the user's notifications read. Other users' notifications are not found.
pub async fn mark_read(pool: &PgPool, user_id: i64, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE notifikasi SET is_read = TRUE WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Returns how many notifications changed.
pub async fn mark_all_read(pool: &PgPool, user_id: i64) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE notifikasi SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
