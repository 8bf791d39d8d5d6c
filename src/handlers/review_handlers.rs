use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::session::require_pusat;
use crate::errors::AppError;
use crate::models::workflow::SubmissionKind;
use crate::submissions::review;

#[derive(Deserialize)]
pub struct RevisionRequest {
    pub message: String,
}

async fn approve(pool: &PgPool, session: &Session, kind: SubmissionKind, id: i64) -> Result<HttpResponse, AppError> {
    let admin = require_pusat(session)?;
    let reviewed = review::approve(pool, admin.user_id, kind, id, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(reviewed))
}

async fn revise(
    pool: &PgPool,
    session: &Session,
    kind: SubmissionKind,
    id: i64,
    message: &str,
) -> Result<HttpResponse, AppError> {
    let admin = require_pusat(session)?;
    let reviewed = review::request_revision(pool, admin.user_id, kind, id, message, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(reviewed))
}

/// POST /api/pusat/rab/{id}/approve
pub async fn approve_rab(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    approve(&pool, &session, SubmissionKind::Rab, path.into_inner()).await
}

/// POST /api/pusat/rab/{id}/revise
pub async fn revise_rab(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<RevisionRequest>,
) -> Result<HttpResponse, AppError> {
    revise(&pool, &session, SubmissionKind::Rab, path.into_inner(), &body.message).await
}

/// POST /api/pusat/lpj/{id}/approve
pub async fn approve_lpj(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    approve(&pool, &session, SubmissionKind::Lpj, path.into_inner()).await
}

/// POST /api/pusat/lpj/{id}/revise
pub async fn revise_lpj(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<RevisionRequest>,
) -> Result<HttpResponse, AppError> {
    revise(&pool, &session, SubmissionKind::Lpj, path.into_inner(), &body.message).await
}
