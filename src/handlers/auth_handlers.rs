use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::api_types::ApiMessage;
use crate::auth::{password, rate_limit::RateLimiter, session};
use crate::errors::AppError;
use crate::models::user::{self, UserDisplay};
use crate::notifications::SessionPollers;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    user: UserDisplay,
}

/// POST /api/auth/login
pub async fn login(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    body: web::Json<LoginRequest>,
    limiter: web::Data<RateLimiter>,
    pollers: web::Data<SessionPollers>,
) -> Result<HttpResponse, AppError> {
    // Rate-limit check BEFORE any database access
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED));
    if limiter.is_blocked(ip) {
        log::warn!("Login blocked for {ip}: too many failed attempts");
        return Err(AppError::RateLimited);
    }

    let found = user::find_by_email(&pool, &body.email).await?;
    let verified = match &found {
        Some(u) => password::verify_password(&body.password, &u.password_hash).unwrap_or(false),
        None => false,
    };
    let Some(u) = found.filter(|_| verified) else {
        limiter.record_failure(ip);
        return Err(AppError::validation("Invalid email or password"));
    };
    limiter.clear(ip);

    let role = u.role().map_err(AppError::Session)?;
    if let Some(previous) = session::session_id(&session) {
        pollers.stop(&previous).await;
    }
    let sid = session::start(&session, &u, role)?;
    pollers.start(&sid, pool.get_ref().clone(), u.id);

    log::info!("User {} logged in as {role}", u.id);
    let _ = crate::audit::log(
        &pool,
        u.id,
        "auth.login",
        "user",
        &u.id.to_string(),
        serde_json::json!({ "summary": "Logged in" }),
    )
    .await;

    Ok(HttpResponse::Ok().json(LoginResponse { user: UserDisplay::from(u) }))
}

/// POST /api/auth/logout
pub async fn logout(
    session: Session,
    pollers: web::Data<SessionPollers>,
) -> Result<HttpResponse, AppError> {
    if let Some(sid) = session::session_id(&session) {
        pollers.stop(&sid).await;
    }
    session.purge();
    Ok(HttpResponse::Ok().json(ApiMessage::new("Logged out")))
}

/// GET /api/auth/me
pub async fn me(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let current = session::current_user(&session)?;
    let u = user::find_by_id(&pool, current.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(HttpResponse::Ok().json(UserDisplay::from(u)))
}
