use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use sqlx::PgPool;

use crate::auth::session::{require_pondok, require_pusat};
use crate::errors::AppError;
use crate::models::dashboard;
use crate::models::periode::PeriodRegistry;

/// GET /api/pusat/dashboard
pub async fn pusat(
    pool: web::Data<PgPool>,
    registry: web::Data<PeriodRegistry>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_pusat(&session)?;
    let overview = dashboard::pusat_overview(&pool, &registry, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(overview))
}

/// GET /api/pondok/dashboard
pub async fn pondok(
    pool: web::Data<PgPool>,
    registry: web::Data<PeriodRegistry>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let (_, pondok_id) = require_pondok(&session)?;
    let overview = dashboard::pondok_overview(&pool, &registry, pondok_id, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(overview))
}
