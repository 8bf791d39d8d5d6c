//! Audit trail writes and startup retention cleanup.

mod common;

use anggaran::audit;
use common::*;

#[tokio::test]
async fn test_cleanup_removes_only_expired_entries() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();

    audit::log(pool, 1, "periode.created", "periode", "202401", serde_json::json!({})).await.unwrap();
    audit::log(pool, 1, "periode.created", "periode", "202501", serde_json::json!({})).await.unwrap();
    sqlx::query("UPDATE audit_log SET created_at = NOW() - make_interval(days => $1) WHERE target_id = '202401'")
        .bind(audit::RETENTION_DAYS + 1)
        .execute(pool)
        .await
        .unwrap();

    assert_eq!(audit::cleanup_old_entries(pool).await.unwrap(), 1);
    assert_eq!(audit::cleanup_old_entries(pool).await.unwrap(), 0);

    let left: Vec<String> = sqlx::query_scalar("SELECT target_id FROM audit_log")
        .fetch_all(pool)
        .await
        .unwrap();
    assert_eq!(left, vec!["202501".to_string()]);
}
