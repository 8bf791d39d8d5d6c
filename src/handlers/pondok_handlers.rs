use std::collections::HashMap;

use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::api_types::{PaginatedResponse, page_params};
use crate::auth::password;
use crate::auth::session::{require_pondok, require_pusat};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::dashboard;
use crate::models::notification::NotificationTopic;
use crate::models::pengurus;
use crate::models::periode::{self, PeriodRegistry};
use crate::models::pondok::{self, Pondok, PondokForm, PondokRegistration};
use crate::models::user::{self, NewUser, Role, UserDisplay};
use crate::models::workflow::SubmissionKind;
use crate::notifications;
use crate::storage;

#[derive(Serialize)]
struct PondokView {
    #[serde(flatten)]
    pondok: Pondok,
    profile_complete: bool,
    users: Vec<UserDisplay>,
}

async fn view(pool: &PgPool, pondok: Pondok) -> Result<PondokView, AppError> {
    let users = user::find_by_pondok(pool, pondok.id)
        .await?
        .into_iter()
        .map(UserDisplay::from)
        .collect();
    Ok(PondokView { profile_complete: pondok.is_profile_complete(), pondok, users })
}

// ---------- Branch admin: own profile ----------

/// GET /api/pondok/profile
pub async fn own_profile(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let (_, pondok_id) = require_pondok(&session)?;
    let found = pondok::find_by_id(&pool, pondok_id).await?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(view(&pool, found).await?))
}

/// PUT /api/pondok/profile
///
/// Any edit sends the profile back to central verification.
pub async fn update_own_profile(
    pool: web::Data<PgPool>,
    session: Session,
    body: web::Json<PondokForm>,
) -> Result<HttpResponse, AppError> {
    let (user, pondok_id) = require_pondok(&session)?;
    let updated = pondok::update_profile(&pool, pondok_id, &body, Utc::now()).await?;

    let entity_id = pondok_id.to_string();
    notifications::notify_central_admins(
        &pool,
        NotificationTopic::Pondok,
        &entity_id,
        &format!("Profil {} diperbarui dan menunggu verifikasi", updated.name),
    )
    .await;

    let details = serde_json::json!({
        "name": updated.name,
        "summary": "Profile updated, awaiting verification",
    });
    let _ = crate::audit::log(&pool, user.user_id, "pondok.updated", "pondok", &entity_id, details).await;

    Ok(HttpResponse::Ok().json(view(&pool, updated).await?))
}

/// GET /api/pondok/eligibility
pub async fn eligibility(
    pool: web::Data<PgPool>,
    registry: web::Data<PeriodRegistry>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let (_, pondok_id) = require_pondok(&session)?;
    let summary = dashboard::branch_eligibility(&pool, &registry, pondok_id, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[derive(Deserialize)]
pub struct UploadTargetQuery {
    pub periode_id: String,
    pub ext: String,
}

async fn upload_target(
    kind: SubmissionKind,
    pool: &PgPool,
    config: &AppConfig,
    session: &Session,
    query: &UploadTargetQuery,
) -> Result<HttpResponse, AppError> {
    let (_, pondok_id) = require_pondok(session)?;
    if let Some(e) = storage::validate_extension(&query.ext) {
        return Err(AppError::validation(e));
    }
    let found = pondok::find_by_id(pool, pondok_id).await?.ok_or(AppError::NotFound)?;
    periode::find_by_id(pool, &query.periode_id).await?.ok_or(AppError::NotFound)?;

    let target = storage::upload_target(
        &config.storage_public_base_url,
        kind,
        &query.periode_id,
        pondok_id,
        &found.name,
        &query.ext,
    );
    Ok(HttpResponse::Ok().json(target))
}

/// GET /api/pondok/rab/upload-target?periode_id=..&ext=..
pub async fn rab_upload_target(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    session: Session,
    query: web::Query<UploadTargetQuery>,
) -> Result<HttpResponse, AppError> {
    upload_target(SubmissionKind::Rab, &pool, &config, &session, &query).await
}

/// GET /api/pondok/lpj/upload-target?periode_id=..&ext=..
pub async fn lpj_upload_target(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    session: Session,
    query: web::Query<UploadTargetQuery>,
) -> Result<HttpResponse, AppError> {
    upload_target(SubmissionKind::Lpj, &pool, &config, &session, &query).await
}

// ---------- Central admin ----------

/// GET /api/pusat/pondok
/// Query params: page, per_page, pending=true (only profiles awaiting verification)
pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    require_pusat(&session)?;
    let (page, per_page) = page_params(&query);
    let pending_only = query.get("pending").is_some_and(|v| v == "true" || v == "1");

    let (items, total) = pondok::find_paginated(&pool, page, per_page, pending_only).await?;
    Ok(HttpResponse::Ok().json(PaginatedResponse { items, page, per_page, total }))
}

/// GET /api/pusat/pondok/{id}
pub async fn read(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_pusat(&session)?;
    let found = pondok::find_by_id(&pool, path.into_inner()).await?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(view(&pool, found).await?))
}

/// POST /api/pusat/pondok
///
/// Registers a branch together with its first branch admin account.
pub async fn register(
    pool: web::Data<PgPool>,
    session: Session,
    body: web::Json<PondokRegistration>,
) -> Result<HttpResponse, AppError> {
    let admin = require_pusat(&session)?;
    let errors = body.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let password_hash = password::hash_password(&body.admin_password).map_err(AppError::Hash)?;

    let mut tx = pool.begin().await?;
    let pondok_id = pondok::create(&mut tx, &body.name).await?;
    let new_user = NewUser {
        email: body.admin_email.clone(),
        password_hash,
        name: pondok::non_empty(&body.admin_name),
        phone: pondok::non_empty(&body.admin_phone),
        role: Role::AdminPondok,
        pondok_id: Some(pondok_id),
    };
    let user_id = user::create(&mut tx, &new_user).await?;
    tx.commit().await?;

    log::info!("Pondok {pondok_id} registered by user {} with admin {user_id}", admin.user_id);
    let details = serde_json::json!({
        "name": body.name.trim(),
        "admin_user_id": user_id,
        "admin_email": body.admin_email.trim(),
        "summary": "Pondok registered",
    });
    let _ = crate::audit::log(&pool, admin.user_id, "pondok.registered", "pondok", &pondok_id.to_string(), details)
        .await;

    let created = pondok::find_by_id(&pool, pondok_id).await?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Created().json(view(&pool, created).await?))
}

/// POST /api/pusat/pondok/{id}/verify
pub async fn verify(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let admin = require_pusat(&session)?;
    let id = path.into_inner();
    let existing = pondok::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    if !existing.is_pending_verification() {
        return Err(AppError::Conflict(format!("Profile of '{}' is not awaiting verification", existing.name)));
    }
    let verified = pondok::verify(&pool, id, Utc::now()).await?;

    let entity_id = id.to_string();
    notifications::notify_pondok_users(
        &pool,
        id,
        NotificationTopic::Pondok,
        &entity_id,
        &notifications::verified_message(&verified.name),
    )
    .await;
    let _ = crate::audit::log(
        &pool,
        admin.user_id,
        "pondok.verified",
        "pondok",
        &entity_id,
        serde_json::json!({ "name": verified.name, "summary": "Profile verified" }),
    )
    .await;

    Ok(HttpResponse::Ok().json(view(&pool, verified).await?))
}

/// GET /api/pusat/pondok/{id}/pengurus
pub async fn pengurus_of(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_pusat(&session)?;
    let id = path.into_inner();
    pondok::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    let members = pengurus::find_by_pondok(&pool, id).await?;
    Ok(HttpResponse::Ok().json(members))
}
