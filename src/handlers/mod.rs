pub mod audit_handlers;
pub mod auth_handlers;
pub mod dashboard;
pub mod lpj_handlers;
pub mod notification_handlers;
pub mod pengurus_handlers;
pub mod periode_handlers;
pub mod pondok_handlers;
pub mod rab_handlers;
pub mod review_handlers;

use std::collections::HashMap;

use actix_web::{middleware::from_fn, web};
use chrono::Utc;
use sqlx::PgPool;

use crate::auth::middleware::{require_auth, require_json_content_type};
use crate::errors::AppError;
use crate::models::periode::PeriodRegistry;
use crate::models::workflow::SubmissionStatus;

/// `?status=` on list endpoints. Absent or empty means all statuses.
fn status_filter(query: &HashMap<String, String>) -> Result<Option<SubmissionStatus>, AppError> {
    match query.get("status").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse::<SubmissionStatus>().map(Some).map_err(AppError::validation),
        None => Ok(None),
    }
}

/// `?periode_id=` on list endpoints, falling back to the current period.
async fn periode_filter(
    pool: &PgPool,
    registry: &PeriodRegistry,
    query: &HashMap<String, String>,
) -> Result<Option<String>, AppError> {
    if let Some(id) = query.get("periode_id").filter(|s| !s.is_empty()) {
        return Ok(Some(id.clone()));
    }
    Ok(registry.current_at(pool, Utc::now()).await?.map(|p| p.id))
}

/// Mount the JSON API under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(from_fn(require_json_content_type))
            // Public
            .route("/auth/login", web::post().to(auth_handlers::login))
            // Protected
            .service(
                web::scope("")
                    .wrap(from_fn(require_auth))
                    .route("/auth/logout", web::post().to(auth_handlers::logout))
                    .route("/auth/me", web::get().to(auth_handlers::me))
                    // Periods: /periode/current BEFORE /periode/{id}
                    .route("/periode", web::get().to(periode_handlers::list))
                    .route("/periode", web::post().to(periode_handlers::create))
                    .route("/periode/current", web::get().to(periode_handlers::current))
                    .route("/periode/{id}", web::get().to(periode_handlers::read))
                    .route("/periode/{id}", web::put().to(periode_handlers::update_windows))
                    // Notifications
                    .route("/notifications", web::get().to(notification_handlers::list))
                    .route("/notifications/unread-count", web::get().to(notification_handlers::unread_count))
                    .route("/notifications/read-all", web::post().to(notification_handlers::mark_all_read))
                    .route("/notifications/{id}/read", web::post().to(notification_handlers::mark_read))
                    // Branch admin
                    .route("/pondok/dashboard", web::get().to(dashboard::pondok))
                    .route("/pondok/profile", web::get().to(pondok_handlers::own_profile))
                    .route("/pondok/profile", web::put().to(pondok_handlers::update_own_profile))
                    .route("/pondok/eligibility", web::get().to(pondok_handlers::eligibility))
                    .route("/pondok/pengurus", web::get().to(pengurus_handlers::list))
                    .route("/pondok/pengurus", web::post().to(pengurus_handlers::create))
                    .route("/pondok/pengurus/{id}", web::put().to(pengurus_handlers::update))
                    .route("/pondok/pengurus/{id}", web::delete().to(pengurus_handlers::delete))
                    // upload-target BEFORE /{id}
                    .route("/pondok/rab/upload-target", web::get().to(pondok_handlers::rab_upload_target))
                    .route("/pondok/rab", web::get().to(rab_handlers::list_own))
                    .route("/pondok/rab", web::post().to(rab_handlers::create))
                    .route("/pondok/rab/{id}", web::get().to(rab_handlers::read_own))
                    .route("/pondok/rab/{id}", web::put().to(rab_handlers::resubmit))
                    .route("/pondok/lpj/upload-target", web::get().to(pondok_handlers::lpj_upload_target))
                    .route("/pondok/lpj", web::get().to(lpj_handlers::list_own))
                    .route("/pondok/lpj", web::post().to(lpj_handlers::create))
                    .route("/pondok/lpj/{id}", web::get().to(lpj_handlers::read_own))
                    .route("/pondok/lpj/{id}", web::put().to(lpj_handlers::resubmit))
                    // Central admin
                    .route("/pusat/dashboard", web::get().to(dashboard::pusat))
                    .route("/pusat/audit", web::get().to(audit_handlers::list))
                    .route("/pusat/pondok", web::get().to(pondok_handlers::list))
                    .route("/pusat/pondok", web::post().to(pondok_handlers::register))
                    .route("/pusat/pondok/{id}", web::get().to(pondok_handlers::read))
                    .route("/pusat/pondok/{id}/verify", web::post().to(pondok_handlers::verify))
                    .route("/pusat/pondok/{id}/pengurus", web::get().to(pondok_handlers::pengurus_of))
                    .route("/pusat/rab", web::get().to(rab_handlers::list))
                    .route("/pusat/rab/{id}", web::get().to(rab_handlers::read))
                    .route("/pusat/rab/{id}/approve", web::post().to(review_handlers::approve_rab))
                    .route("/pusat/rab/{id}/revise", web::post().to(review_handlers::revise_rab))
                    .route("/pusat/lpj", web::get().to(lpj_handlers::list))
                    .route("/pusat/lpj/{id}", web::get().to(lpj_handlers::read))
                    .route("/pusat/lpj/{id}/approve", web::post().to(review_handlers::approve_lpj))
                    .route("/pusat/lpj/{id}/revise", web::post().to(review_handlers::revise_lpj)),
            ),
    );
}
