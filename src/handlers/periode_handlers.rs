use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use sqlx::PgPool;

use crate::auth::session::{current_user, require_pusat};
use crate::errors::AppError;
use crate::models::periode::{self, PeriodRegistry, PeriodeForm, PeriodeWindowsForm};

/// GET /api/periode
pub async fn list(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    current_user(&session)?;
    let periods = periode::find_all(&pool).await?;
    Ok(HttpResponse::Ok().json(periods))
}

/// GET /api/periode/current
///
/// Responds with `null` when no period is current.
pub async fn current(
    pool: web::Data<PgPool>,
    registry: web::Data<PeriodRegistry>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    current_user(&session)?;
    let current = registry.current_at(&pool, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(current))
}

/// GET /api/periode/{id}
pub async fn read(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    current_user(&session)?;
    let found = periode::find_by_id(&pool, &path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(found))
}

/// POST /api/periode
pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    body: web::Json<PeriodeForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_pusat(&session)?;
    let created = periode::create(&pool, &body).await?;

    log::info!("Period {} created by user {}", created.id, admin.user_id);
    let details = serde_json::json!({
        "rab": [created.rab_start, created.rab_end],
        "lpj": [created.lpj_start, created.lpj_end],
        "summary": format!("Period {} created", created.id),
    });
    let _ = crate::audit::log(&pool, admin.user_id, "periode.created", "periode", &created.id, details).await;

    Ok(HttpResponse::Created().json(created))
}

/// PUT /api/periode/{id}
pub async fn update_windows(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<String>,
    body: web::Json<PeriodeWindowsForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_pusat(&session)?;
    let id = path.into_inner();
    let before = periode::find_by_id(&pool, &id).await?.ok_or(AppError::NotFound)?;
    let updated = periode::update_windows(&pool, &id, &body).await?;

    let details = serde_json::json!({
        "before": { "rab": [before.rab_start, before.rab_end], "lpj": [before.lpj_start, before.lpj_end] },
        "after": { "rab": [updated.rab_start, updated.rab_end], "lpj": [updated.lpj_start, updated.lpj_end] },
    });
    let _ = crate::audit::log(&pool, admin.user_id, "periode.updated", "periode", &id, details).await;

    Ok(HttpResponse::Ok().json(updated))
}
