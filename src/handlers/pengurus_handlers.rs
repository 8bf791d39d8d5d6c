use actix_session::Session;
use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::api_types::ApiMessage;
use crate::auth::session::require_pondok;
use crate::errors::AppError;
use crate::models::pengurus::{self, PengurusForm};

/// GET /api/pondok/pengurus
pub async fn list(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let (_, pondok_id) = require_pondok(&session)?;
    let members = pengurus::find_by_pondok(&pool, pondok_id).await?;
    Ok(HttpResponse::Ok().json(members))
}

/// POST /api/pondok/pengurus
pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    body: web::Json<PengurusForm>,
) -> Result<HttpResponse, AppError> {
    let (user, pondok_id) = require_pondok(&session)?;
    let created = pengurus::create(&pool, pondok_id, &body).await?;

    let details = serde_json::json!({
        "pondok_id": pondok_id,
        "name": created.name,
        "jabatan": created.jabatan,
    });
    let _ = crate::audit::log(&pool, user.user_id, "pengurus.created", "pengurus", &created.id.to_string(), details)
        .await;

    Ok(HttpResponse::Created().json(created))
}

/// PUT /api/pondok/pengurus/{id}
pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<PengurusForm>,
) -> Result<HttpResponse, AppError> {
    let (user, pondok_id) = require_pondok(&session)?;
    let updated = pengurus::update(&pool, pondok_id, path.into_inner(), &body).await?;

    let details = serde_json::json!({
        "pondok_id": pondok_id,
        "name": updated.name,
        "jabatan": updated.jabatan,
    });
    let _ = crate::audit::log(&pool, user.user_id, "pengurus.updated", "pengurus", &updated.id.to_string(), details)
        .await;

    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /api/pondok/pengurus/{id}
pub async fn delete(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let (user, pondok_id) = require_pondok(&session)?;
    let id = path.into_inner();
    pengurus::delete(&pool, pondok_id, id).await?;

    let _ = crate::audit::log(
        &pool,
        user.user_id,
        "pengurus.deleted",
        "pengurus",
        &id.to_string(),
        serde_json::json!({ "pondok_id": pondok_id }),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiMessage::new("Pengurus deleted")))
}
