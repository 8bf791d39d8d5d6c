use sqlx::{PgConnection, PgPool};

use super::types::{NewUser, Role, User};
use crate::errors::AppError;

const SELECT_USER: &str =
    "SELECT id, email, password_hash, name, phone, role, pondok_id, created_at FROM users";

/// Find user by email for authentication (case-insensitive).
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE LOWER(email) = LOWER($1)"))
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Users attached to one branch.
pub async fn find_by_pondok(pool: &PgPool, pondok_id: i64) -> Result<Vec<User>, AppError> {
    let rows = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE pondok_id = $1 ORDER BY id"))
        .bind(pondok_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn ids_by_role(pool: &PgPool, role: Role) -> Result<Vec<i64>, AppError> {
    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM users WHERE role = $1 ORDER BY id")
        .bind(role.as_str())
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

pub async fn ids_for_pondok(pool: &PgPool, pondok_id: i64) -> Result<Vec<i64>, AppError> {
    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM users WHERE pondok_id = $1 ORDER BY id")
        .bind(pondok_id)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

pub async fn count_by_role(pool: &PgPool, role: Role) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
        .bind(role.as_str())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Insert a user. A duplicate email surfaces as `AppError::Conflict`.
pub async fn create(conn: &mut PgConnection, new: &NewUser) -> Result<i64, AppError> {
    if new.role == Role::AdminPondok && new.pondok_id.is_none() {
        return Err(AppError::validation("A branch admin must belong to a pondok"));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (email, password_hash, name, phone, role, pondok_id) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(new.email.trim())
    .bind(&new.password_hash)
    .bind(&new.name)
    .bind(&new.phone)
    .bind(new.role.as_str())
    .bind(new.pondok_id)
    .fetch_one(conn)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(format!("Email '{}' is already registered", new.email.trim())),
        other => other,
    })?;

    Ok(id)
}
