use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::password;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::user::{self, NewUser, Role};

pub async fn init_pool(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Create the first central admin when none exists yet. Returns the new user id, if any.
pub async fn seed_admin(pool: &PgPool, email: &str, plain_password: &str) -> Result<Option<i64>, AppError> {
    if user::count_by_role(pool, Role::AdminPusat).await? > 0 {
        return Ok(None);
    }

    let password_hash = password::hash_password(plain_password).map_err(AppError::Hash)?;
    let new_user = NewUser {
        email: email.to_string(),
        password_hash,
        name: Some("Admin Pusat".to_string()),
        phone: None,
        role: Role::AdminPusat,
        pondok_id: None,
    };

    let mut conn = pool.acquire().await?;
    let id = user::create(&mut conn, &new_user).await?;
    log::warn!("Seeded central admin '{email}'; change its password");
    Ok(Some(id))
}
