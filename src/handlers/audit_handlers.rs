use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::PgPool;

use crate::api_types::PaginatedResponse;
use crate::auth::session::require_pusat;
use crate::errors::AppError;
use crate::models::audit;

#[derive(Deserialize)]
pub struct AuditQuery {
    page: Option<i64>,
    per_page: Option<i64>,
    action: Option<String>,
    target_type: Option<String>,
    target_id: Option<String>,
}

/// GET /api/pusat/audit
/// Query params: page, per_page, action, target_type; with target_type + target_id, the full history of one record.
pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
    query: web::Query<AuditQuery>,
) -> Result<HttpResponse, AppError> {
    require_pusat(&session)?;

    if let (Some(target_type), Some(target_id)) = (query.target_type.as_deref(), query.target_id.as_deref()) {
        let entries = audit::find_for_target(&pool, target_type, target_id).await?;
        return Ok(HttpResponse::Ok().json(entries));
    }

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(25).clamp(1, 100);
    let action_filter = query.action.as_deref().filter(|s| !s.is_empty());
    let target_type_filter = query.target_type.as_deref().filter(|s| !s.is_empty());

    let (items, total) = audit::find_paginated(&pool, page, per_page, action_filter, target_type_filter).await?;
    Ok(HttpResponse::Ok().json(PaginatedResponse { items, page, per_page, total }))
}
