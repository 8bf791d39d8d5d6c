use sqlx::{PgConnection, PgPool};

use super::types::*;
use crate::errors::AppError;
use crate::models::workflow::{ReviewState, SubmissionStatus};

const RAB_COLUMNS: &str = "r.id, r.pondok_id, r.periode_id, r.status, r.submitted_at, r.accepted_at, \
     r.saldo_awal, r.total_pemasukan, r.total_pengeluaran, r.proof_url, r.revision_message";

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Rab>, AppError> {
    let row = sqlx::query_as::<_, RabRow>(&format!("SELECT {RAB_COLUMNS} FROM rab r WHERE r.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Rab::try_from).transpose()
}

pub async fn find_by_pondok_and_periode(
    pool: &PgPool,
    pondok_id: i64,
    periode_id: &str,
) -> Result<Option<Rab>, AppError> {
    let row = sqlx::query_as::<_, RabRow>(&format!(
        "SELECT {RAB_COLUMNS} FROM rab r WHERE r.pondok_id = $1 AND r.periode_id = $2"
    ))
    .bind(pondok_id)
    .bind(periode_id)
    .fetch_optional(pool)
    .await?;
    row.map(Rab::try_from).transpose()
}

/// Items in insertion order.
pub async fn find_items(pool: &PgPool, rab_id: i64) -> Result<Vec<RabItem>, AppError> {
    let items = sqlx::query_as::<_, RabItem>(
        "SELECT id, rab_id, position, kategori, deskripsi, jumlah FROM rab_items \
         WHERE rab_id = $1 ORDER BY position, id",
    )
    .bind(rab_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

pub async fn find_detail(pool: &PgPool, id: i64) -> Result<Option<RabDetail>, AppError> {
    let row = sqlx::query_as::<_, RabListRow>(&format!(
        "SELECT {RAB_COLUMNS}, p.name AS pondok_name FROM rab r \
         JOIN pondok p ON p.id = r.pondok_id WHERE r.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else { return Ok(None) };
    let listed = RabListItem::try_from(row)?;
    let items = find_items(pool, listed.rab.id).await?;
    Ok(Some(RabDetail { rab: listed.rab, pondok_name: listed.pondok_name, items }))
}

/// RABs of a period with branch names, newest submission first.
pub async fn list_by_periode(
    pool: &PgPool,
    periode_id: &str,
    status: Option<SubmissionStatus>,
    page: i64,
    per_page: i64,
) -> Result<(Vec<RabListItem>, i64), AppError> {
    let offset = (page.max(1) - 1) * per_page;
    let status = status.map(|s| s.as_str());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM rab WHERE periode_id = $1 AND ($2::TEXT IS NULL OR status = $2)",
    )
    .bind(periode_id)
    .bind(status)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, RabListRow>(&format!(
        "SELECT {RAB_COLUMNS}, p.name AS pondok_name FROM rab r \
         JOIN pondok p ON p.id = r.pondok_id \
         WHERE r.periode_id = $1 AND ($2::TEXT IS NULL OR r.status = $2) \
         ORDER BY r.submitted_at DESC NULLS LAST, r.id DESC \
         LIMIT $3 OFFSET $4"
    ))
    .bind(periode_id)
    .bind(status)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let items = rows
        .into_iter()
        .map(RabListItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((items, total))
}

/// All RABs of one branch across periods, newest period first.
pub async fn list_for_pondok(pool: &PgPool, pondok_id: i64) -> Result<Vec<RabListItem>, AppError> {
    let rows = sqlx::query_as::<_, RabListRow>(&format!(
        "SELECT {RAB_COLUMNS}, p.name AS pondok_name FROM rab r \
         JOIN pondok p ON p.id = r.pondok_id \
         WHERE r.pondok_id = $1 ORDER BY r.periode_id DESC"
    ))
    .bind(pondok_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(RabListItem::try_from).collect()
}

/// Insert a new RAB in `state` together with its items. Call inside a transaction.
pub async fn insert(
    conn: &mut PgConnection,
    pondok_id: i64,
    periode_id: &str,
    form: &RabForm,
    state: &ReviewState,
) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO rab (pondok_id, periode_id, status, submitted_at, accepted_at, saldo_awal, \
             total_pemasukan, total_pengeluaran, proof_url, revision_message) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
    )
    .bind(pondok_id)
    .bind(periode_id)
    .bind(state.status.as_str())
    .bind(state.submitted_at)
    .bind(state.accepted_at)
    .bind(form.saldo_awal)
    .bind(form.total_pemasukan)
    .bind(form.total_pengeluaran())
    .bind(form.proof_url())
    .bind(&state.revision_message)
    .fetch_one(&mut *conn)
    .await?;

    insert_items(conn, id, &form.items).await?;
    Ok(id)
}

/// Overwrite a RAB in revision with resubmitted values and replace its items.
/// Returns false when the record is no longer in `revisi`.
pub async fn resubmit(
    conn: &mut PgConnection,
    id: i64,
    form: &RabForm,
    next: &ReviewState,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE rab SET status = $1, submitted_at = $2, accepted_at = $3, revision_message = $4, \
             saldo_awal = $5, total_pemasukan = $6, total_pengeluaran = $7, proof_url = $8 \
         WHERE id = $9 AND status = $10",
    )
    .bind(next.status.as_str())
    .bind(next.submitted_at)
    .bind(next.accepted_at)
    .bind(&next.revision_message)
    .bind(form.saldo_awal)
    .bind(form.total_pemasukan)
    .bind(form.total_pengeluaran())
    .bind(form.proof_url())
    .bind(id)
    .bind(SubmissionStatus::Revisi.as_str())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query("DELETE FROM rab_items WHERE rab_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    insert_items(conn, id, &form.items).await?;
    Ok(true)
}

async fn insert_items(conn: &mut PgConnection, rab_id: i64, items: &[RabItemInput]) -> Result<(), AppError> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO rab_items (rab_id, position, kategori, deskripsi, jumlah) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(rab_id)
        .bind(position as i32)
        .bind(item.kategori.trim())
        .bind(item.deskripsi.trim())
        .bind(item.jumlah)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
