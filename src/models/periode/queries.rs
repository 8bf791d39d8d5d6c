use sqlx::PgPool;

use super::types::*;
use crate::errors::AppError;

const SELECT_PERIODE: &str = "SELECT id, year, month, rab_start, rab_end, lpj_start, lpj_end, created_at FROM periode";

/// All periods, newest first.
pub async fn find_all(pool: &PgPool) -> Result<Vec<Periode>, AppError> {
    let rows = sqlx::query_as::<_, Periode>(&format!("{SELECT_PERIODE} ORDER BY id DESC"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Periode>, AppError> {
    let row = sqlx::query_as::<_, Periode>(&format!("{SELECT_PERIODE} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Most recently created period (highest id on equal timestamps).
pub async fn find_latest(pool: &PgPool) -> Result<Option<Periode>, AppError> {
    let row = sqlx::query_as::<_, Periode>(&format!(
        "{SELECT_PERIODE} ORDER BY created_at DESC, id DESC LIMIT 1"
    ))
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Create a period from a validated form. A duplicate year+month is a conflict.
pub async fn create(pool: &PgPool, form: &PeriodeForm) -> Result<Periode, AppError> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let row = sqlx::query_as::<_, Periode>(
        "INSERT INTO periode (id, year, month, rab_start, rab_end, lpj_start, lpj_end) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, year, month, rab_start, rab_end, lpj_start, lpj_end, created_at",
    )
    .bind(form.id())
    .bind(form.year)
    .bind(form.month)
    .bind(form.rab_start)
    .bind(form.rab_end)
    .bind(form.lpj_start)
    .bind(form.lpj_end)
    .fetch_one(pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(format!("Period {} already exists", form.id())),
        other => other,
    })?;

    Ok(row)
}

/// Replace the RAB/LPJ windows of an existing period.
pub async fn update_windows(
    pool: &PgPool,
    id: &str,
    form: &PeriodeWindowsForm,
) -> Result<Periode, AppError> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let row = sqlx::query_as::<_, Periode>(
        "UPDATE periode SET rab_start = $1, rab_end = $2, lpj_start = $3, lpj_end = $4 \
         WHERE id = $5 \
         RETURNING id, year, month, rab_start, rab_end, lpj_start, lpj_end, created_at",
    )
    .bind(form.rab_start)
    .bind(form.rab_end)
    .bind(form.lpj_start)
    .bind(form.lpj_end)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or(AppError::NotFound)
}
