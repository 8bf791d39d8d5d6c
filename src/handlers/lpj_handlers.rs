use std::collections::HashMap;

use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use sqlx::PgPool;

use super::{periode_filter, status_filter};
use crate::api_types::{PaginatedResponse, page_params};
use crate::auth::session::{require_pondok, require_pusat};
use crate::errors::AppError;
use crate::models::lpj::{self, LpjForm};
use crate::models::periode::PeriodRegistry;
use crate::submissions;

/// GET /api/pondok/lpj
pub async fn list_own(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let (_, pondok_id) = require_pondok(&session)?;
    let items = lpj::list_for_pondok(&pool, pondok_id).await?;
    Ok(HttpResponse::Ok().json(items))
}

/// GET /api/pondok/lpj/{id}
pub async fn read_own(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let (_, pondok_id) = require_pondok(&session)?;
    let detail = lpj::find_detail(&pool, path.into_inner())
        .await?
        .filter(|d| d.lpj.pondok_id == pondok_id)
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(detail))
}

/// POST /api/pondok/lpj
///
/// `saldo_awal` in the body is ignored; it always comes from the accepted RAB.
pub async fn create(
    pool: web::Data<PgPool>,
    registry: web::Data<PeriodRegistry>,
    session: Session,
    body: web::Json<LpjForm>,
) -> Result<HttpResponse, AppError> {
    let (user, pondok_id) = require_pondok(&session)?;
    let detail = submissions::lpj::create(&pool, &registry, user.user_id, pondok_id, &body, Utc::now()).await?;
    Ok(HttpResponse::Created().json(detail))
}

/// PUT /api/pondok/lpj/{id}
pub async fn resubmit(
    pool: web::Data<PgPool>,
    registry: web::Data<PeriodRegistry>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<LpjForm>,
) -> Result<HttpResponse, AppError> {
    let (user, pondok_id) = require_pondok(&session)?;
    let detail = submissions::lpj::resubmit(
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

/// GET /api/pusat/lpj
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
        Some(periode_id) => lpj::list_by_periode(&pool, &periode_id, status, page, per_page).await?,
        None => (Vec::new(), 0),
    };
    Ok(HttpResponse::Ok().json(PaginatedResponse { items, page, per_page, total }))
}

/// GET /api/pusat/lpj/{id}
pub async fn read(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_pusat(&session)?;
    let detail = lpj::find_detail(&pool, path.into_inner()).await?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(detail))
}
