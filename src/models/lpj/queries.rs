use sqlx::{PgConnection, PgPool};

use super::types::*;
use crate::errors::AppError;
use crate::models::workflow::{LpjLedger, ReviewState, SubmissionStatus};

const LPJ_COLUMNS: &str = "l.id, l.pondok_id, l.periode_id, l.rab_id, l.status, l.submitted_at, \
     l.accepted_at, l.saldo_awal, l.total_pemasukan, l.total_pengeluaran, l.sisa_saldo, \
     l.proof_url, l.revision_message";

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Lpj>, AppError> {
    let row = sqlx::query_as::<_, LpjRow>(&format!("SELECT {LPJ_COLUMNS} FROM lpj l WHERE l.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Lpj::try_from).transpose()
}

pub async fn find_by_pondok_and_periode(
    pool: &PgPool,
    pondok_id: i64,
    periode_id: &str,
) -> Result<Option<Lpj>, AppError> {
    let row = sqlx::query_as::<_, LpjRow>(&format!(
        "SELECT {LPJ_COLUMNS} FROM lpj l WHERE l.pondok_id = $1 AND l.periode_id = $2"
    ))
    .bind(pondok_id)
    .bind(periode_id)
    .fetch_optional(pool)
    .await?;
    row.map(Lpj::try_from).transpose()
}

pub async fn find_items(pool: &PgPool, lpj_id: i64) -> Result<Vec<LpjItem>, AppError> {
    let items = sqlx::query_as::<_, LpjItem>(
        "SELECT id, lpj_id, position, kategori, deskripsi, anggaran, realisasi FROM lpj_items \
         WHERE lpj_id = $1 ORDER BY position, id",
    )
    .bind(lpj_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

pub async fn find_detail(pool: &PgPool, id: i64) -> Result<Option<LpjDetail>, AppError> {
    let row = sqlx::query_as::<_, LpjListRow>(&format!(
        "SELECT {LPJ_COLUMNS}, p.name AS pondok_name FROM lpj l \
         JOIN pondok p ON p.id = l.pondok_id WHERE l.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else { return Ok(None) };
    let listed = LpjListItem::try_from(row)?;
    let items = find_items(pool, listed.lpj.id).await?;
    Ok(Some(LpjDetail { lpj: listed.lpj, pondok_name: listed.pondok_name, items }))
}

/// LPJs of a period with branch names, newest submission first.
pub async fn list_by_periode(
    pool: &PgPool,
    periode_id: &str,
    status: Option<SubmissionStatus>,
    page: i64,
    per_page: i64,
) -> Result<(Vec<LpjListItem>, i64), AppError> {
    let offset = (page.max(1) - 1) * per_page;
    let status = status.map(|s| s.as_str());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM lpj WHERE periode_id = $1 AND ($2::TEXT IS NULL OR status = $2)",
    )
    .bind(periode_id)
    .bind(status)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, LpjListRow>(&format!(
        "SELECT {LPJ_COLUMNS}, p.name AS pondok_name FROM lpj l \
         JOIN pondok p ON p.id = l.pondok_id \
         WHERE l.periode_id = $1 AND ($2::TEXT IS NULL OR l.status = $2) \
         ORDER BY l.submitted_at DESC NULLS LAST, l.id DESC \
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
        .map(LpjListItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((items, total))
}

pub async fn list_for_pondok(pool: &PgPool, pondok_id: i64) -> Result<Vec<LpjListItem>, AppError> {
    let rows = sqlx::query_as::<_, LpjListRow>(&format!(
        "SELECT {LPJ_COLUMNS}, p.name AS pondok_name FROM lpj l \
         JOIN pondok p ON p.id = l.pondok_id \
         WHERE l.pondok_id = $1 ORDER BY l.periode_id DESC"
    ))
    .bind(pondok_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(LpjListItem::try_from).collect()
}

/// Insert a new LPJ with its balances and items. Call inside a transaction.
pub async fn insert(
    conn: &mut PgConnection,
    pondok_id: i64,
    periode_id: &str,
    rab_id: i64,
    ledger: &LpjLedger,
    form: &LpjForm,
    state: &ReviewState,
) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO lpj (pondok_id, periode_id, rab_id, status, submitted_at, accepted_at, \
             saldo_awal, total_pemasukan, total_pengeluaran, sisa_saldo, proof_url, revision_message) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id",
    )
    .bind(pondok_id)
    .bind(periode_id)
    .bind(rab_id)
    .bind(state.status.as_str())
    .bind(state.submitted_at)
    .bind(state.accepted_at)
    .bind(ledger.saldo_awal())
    .bind(ledger.total_pemasukan())
    .bind(ledger.total_pengeluaran())
    .bind(ledger.sisa_saldo())
    .bind(form.proof_url())
    .bind(&state.revision_message)
    .fetch_one(&mut *conn)
    .await?;

    insert_items(conn, id, &form.items).await?;
    Ok(id)
}

/// Overwrite an LPJ in revision and replace its items. The opening balance is not touched.
/// Returns false when the record is no longer in `revisi`.
pub async fn resubmit(
    conn: &mut PgConnection,
    id: i64,
    ledger: &LpjLedger,
    form: &LpjForm,
    next: &ReviewState,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE lpj SET status = $1, submitted_at = $2, accepted_at = $3, revision_message = $4, \
             total_pemasukan = $5, total_pengeluaran = $6, sisa_saldo = $7, proof_url = $8 \
         WHERE id = $9 AND status = $10 AND saldo_awal = $11",
    )
    .bind(next.status.as_str())
    .bind(next.submitted_at)
    .bind(next.accepted_at)
    .bind(&next.revision_message)
    .bind(ledger.total_pemasukan())
    .bind(ledger.total_pengeluaran())
    .bind(ledger.sisa_saldo())
    .bind(form.proof_url())
    .bind(id)
    .bind(SubmissionStatus::Revisi.as_str())
    .bind(ledger.saldo_awal())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query("DELETE FROM lpj_items WHERE lpj_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    insert_items(conn, id, &form.items).await?;
    Ok(true)
}

async fn insert_items(conn: &mut PgConnection, lpj_id: i64, items: &[LpjItemInput]) -> Result<(), AppError> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO lpj_items (lpj_id, position, kategori, deskripsi, anggaran, realisasi) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(lpj_id)
        .bind(position as i32)
        .bind(item.kategori.trim())
        .bind(item.deskripsi.trim())
        .bind(item.anggaran)
        .bind(item.realisasi)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
