use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Serialize;
use sqlx::PgPool;

use crate::auth::session::{self, current_user};
use crate::errors::AppError;
use crate::models::notification;
use crate::notifications::SessionPollers;

#[derive(Serialize)]
struct UnreadCount {
    unread: i64,
}

#[derive(Serialize)]
struct MarkedAll {
    updated: u64,
}

/// GET /api/notifications
pub async fn list(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    let items = notification::find_for_user(&pool, user.user_id).await?;
    Ok(HttpResponse::Ok().json(items))
}

/// GET /api/notifications/unread-count
///
/// Served from this session's poller once it has a value, otherwise counted directly.
pub async fn unread_count(
    pool: web::Data<PgPool>,
    pollers: web::Data<SessionPollers>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    let cached = session::session_id(&session).and_then(|sid| pollers.unread(&sid));
    let unread = match cached {
        Some(n) => n,
        None => notification::count_unread(&pool, user.user_id).await?,
    };
    Ok(HttpResponse::Ok().json(UnreadCount { unread }))
}

/// POST /api/notifications/{id}/read
pub async fn mark_read(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    notification::mark_read(&pool, user.user_id, path.into_inner()).await?;
    let unread = notification::count_unread(&pool, user.user_id).await?;
    Ok(HttpResponse::Ok().json(UnreadCount { unread }))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    let updated = notification::mark_all_read(&pool, user.user_id).await?;
    Ok(HttpResponse::Ok().json(MarkedAll { updated }))
}
