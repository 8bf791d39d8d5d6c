use sqlx::PgPool;

use super::types::*;
use crate::errors::AppError;
use crate::models::pondok::non_empty;

pub async fn find_by_pondok(pool: &PgPool, pondok_id: i64) -> Result<Vec<Pengurus>, AppError> {
    let rows = sqlx::query_as::<_, Pengurus>(
        "SELECT id, pondok_id, name, phone, jabatan, created_at FROM pengurus \
         WHERE pondok_id = $1 ORDER BY created_at, id",
    )
    .bind(pondok_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create(pool: &PgPool, pondok_id: i64, form: &PengurusForm) -> Result<Pengurus, AppError> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let row = sqlx::query_as::<_, Pengurus>(
        "INSERT INTO pengurus (pondok_id, name, phone, jabatan) VALUES ($1, $2, $3, $4) \
         RETURNING id, pondok_id, name, phone, jabatan, created_at",
    )
    .bind(pondok_id)
    .bind(form.name.trim())
    .bind(non_empty(&form.phone))
    .bind(form.jabatan.as_str())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Update a member of `pondok_id`; members of other branches are reported as not found.
pub async fn update(
    pool: &PgPool,
    pondok_id: i64,
    id: i64,
    form: &PengurusForm,
) -> Result<Pengurus, AppError> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let row = sqlx::query_as::<_, Pengurus>(
        "UPDATE pengurus SET name = $1, phone = $2, jabatan = $3 \
         WHERE id = $4 AND pondok_id = $5 \
         RETURNING id, pondok_id, name, phone, jabatan, created_at",
    )
    .bind(form.name.trim())
    .bind(non_empty(&form.phone))
    .bind(form.jabatan.as_str())
    .bind(id)
    .bind(pondok_id)
    .fetch_optional(pool)
    .await?;

    row.ok_or(AppError::NotFound)
}

pub async fn delete(pool: &PgPool, pondok_id: i64, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM pengurus WHERE id = $1 AND pondok_id = $2")
        .bind(id)
        .bind(pondok_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
