use std::collections::HashMap;

use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use sqlx::PgPool;

use super::{periode_filter, status_filter};
use crate::api_types::{PaginatedResponse, page_params};
use crate::auth::session::{require_pondok, require_pusat};
use crate::errors::AppError;
use crate::models::periode::PeriodRegistry;
use crate::models::rab::{self, RabForm};
use crate::submissions;

// ---------- Branch admin ----------

/// GET /api/pondok/rab
pub async fn list_own(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let (_, pondok_id) = require_pondok(&session)?;
    let items = rab::list_for_pondok(&pool, pondok_id).await?;
    Ok(HttpResponse::Ok().json(items))
}

/// GET /api/pondok/rab/{id}
pub async fn read_own(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let (_, pondok_id) = require_pondok(&session)?;
    let detail = rab::find_detail(&pool, path.into_inner())
        .await?
        .filter(|d| d.rab.pondok_id == pondok_id)
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(detail))
}

/// POST /api/pondok/rab
pub async fn create(
    pool: web::Data<PgPool>,
    registry: web::Data<PeriodRegistry>,
    session: Session,
    body: web::Json<RabForm>,
) -> Result<HttpResponse, AppError> {
    let (user, pondok_id) = require_pondok(&session)?;
    let detail = submissions::rab::create(&pool, &registry, user.user_id, pondok_id, &body, Utc::now()).await?;
    Ok(HttpResponse::Created().json(detail))
}

/// PUT /api/pondok/rab/{id}
pub async fn resubmit(
    pool: web::Data<PgPool>,
    registry: web::Data<PeriodRegistry>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<RabForm>,
) -> Result<HttpResponse, AppError> {
    let (user, pondok_id) = require_pondok(&session)?;
    let detail = submissions::rab::resubmit(
        &pool,
        &registry,
        user.user_id,
        pondok_id,
        path.into_inner(),
        &body,
        Utc::now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(detail))
}

// ---------- Central admin ----------

/// GET /api/pusat/rab
/// Query params: periode_id (default: current period), status, page, per_page
pub async fn list(
    pool: web::Data<PgPool>,
    registry: web::Data<PeriodRegistry>,
    session: Session,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    require_pusat(&session)?;
    let (page, per_page) = page_params(&query);
    let status = status_filter(&query)?;

    let (items, total) = match periode_filter(&pool, &registry, &query).await? {
        Some(periode_id) => rab::list_by_periode(&pool, &periode_id, status, page, per_page).await?,
        None => (Vec::new(), 0),
    };
    Ok(HttpResponse::Ok().json(PaginatedResponse { items, page, per_page, total }))
}

/// GET /api/pusat/rab/{id}
pub async fn read(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_pusat(&session)?;
    let detail = rab::find_detail(&pool, path.into_inner()).await?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(detail))
}
