use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use super::types::*;
use crate::errors::AppError;

const SELECT_PONDOK: &str = "\
    SELECT id, name, phone, address, provinsi_id, kota_id, kecamatan_id, kelurahan_id, \
           kode_pos, daerah_sambung_id, updated_at, accepted_at \
    FROM pondok";

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Pondok>, AppError> {
    let row = sqlx::query_as::<_, Pondok>(&format!("{SELECT_PONDOK} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Branches ordered by name. `pending_only` restricts to profiles awaiting verification.
pub async fn find_paginated(
    pool: &PgPool,
    page: i64,
    per_page: i64,
    pending_only: bool,
) -> Result<(Vec<Pondok>, i64), AppError> {
    let offset = (page.max(1) - 1) * per_page;
    let filter = if pending_only { "WHERE accepted_at IS NULL" } else { "" };

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM pondok {filter}"))
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as::<_, Pondok>(&format!(
        "{SELECT_PONDOK} {filter} ORDER BY name, id LIMIT $1 OFFSET $2"
    ))
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

pub async fn count(pool: &PgPool) -> Result<i64, AppError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pondok")
        .fetch_one(pool)
        .await?;
    Ok(total)
}

/// Insert a bare branch (name only). Runs on the caller's connection so it can share a transaction.
pub async fn create(conn: &mut PgConnection, name: &str) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar("INSERT INTO pondok (name) VALUES ($1) RETURNING id")
        .bind(name.trim())
        .fetch_one(conn)
        .await?;
    Ok(id)
}

/// Save a profile edit. The profile drops back to unverified until a central admin accepts it.
pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    form: &PondokForm,
    now: DateTime<Utc>,
) -> Result<Pondok, AppError> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let row = sqlx::query_as::<_, Pondok>(
        "UPDATE pondok SET name = $1, phone = $2, address = $3, provinsi_id = $4, kota_id = $5, \
             kecamatan_id = $6, kelurahan_id = $7, kode_pos = $8, daerah_sambung_id = $9, \
             updated_at = $10, accepted_at = NULL \
         WHERE id = $11 \
         RETURNING id, name, phone, address, provinsi_id, kota_id, kecamatan_id, kelurahan_id, \
                   kode_pos, daerah_sambung_id, updated_at, accepted_at",
    )
    .bind(form.name.trim())
    .bind(non_empty(&form.phone))
    .bind(non_empty(&form.address))
    .bind(form.provinsi_id)
    .bind(form.kota_id)
    .bind(form.kecamatan_id)
    .bind(form.kelurahan_id)
    .bind(non_empty(&form.kode_pos))
    .bind(form.daerah_sambung_id)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or(AppError::NotFound)
}

/// Central admin accepts the current profile.
pub async fn verify(pool: &PgPool, id: i64, now: DateTime<Utc>) -> Result<Pondok, AppError> {
    let row = sqlx::query_as::<_, Pondok>(
        "UPDATE pondok SET accepted_at = $1 WHERE id = $2 \
         RETURNING id, name, phone, address, provinsi_id, kota_id, kecamatan_id, kelurahan_id, \
                   kode_pos, daerah_sambung_id, updated_at, accepted_at",
    )
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or(AppError::NotFound)
}
