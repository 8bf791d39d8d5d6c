//! Request guards on the `/api` scope and the session login flow over HTTP.

mod common;

use std::time::Duration;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, cookie::Key, http::StatusCode, http::header, test, web};
use anggaran::auth::rate_limit::RateLimiter;
use anggaran::config::AppConfig;
use anggaran::handlers;
use anggaran::models::user::Role;
use anggaran::notifications::SessionPollers;
use common::*;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

fn config() -> AppConfig {
    AppConfig::from_lookup(|key| (key == "DATABASE_URL").then(|| "postgres://localhost/unused".to_string()))
        .expect("config")
}

/// The production route table behind a cookie session.
macro_rules! api_app {
    ($pool:expr, $limiter:expr) => {
        api_app!($pool, $limiter, SessionPollers::new(Duration::from_secs(60), Duration::from_secs(600)))
    };
    ($pool:expr, $limiter:expr, $pollers:expr) => {
        test::init_service(
            App::new()
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .app_data(web::Data::new($pool))
                .app_data(web::Data::new(registry()))
                .app_data(web::Data::new($pollers))
                .app_data(web::Data::new($limiter))
                .app_data(web::Data::new(config()))
                .configure(handlers::configure),
        )
        .await
    };
}

fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .expect("lazy pool")
}

#[actix_rt::test]
async fn test_protected_route_without_session_is_401() {
    let app = api_app!(lazy_pool(), RateLimiter::default());

    let req = test::TestRequest::get().uri("/api/auth/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Not logged in");

    let req = test::TestRequest::get().uri("/api/pusat/rab").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_mutation_without_json_content_type_is_415() {
    let app = api_app!(lazy_pool(), RateLimiter::default());

    let req = test::TestRequest::post()
        .uri("/api/periode")
        .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
        .set_payload("year=2025&month=1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    // Login is public but still JSON only
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_payload("email=a&password=b")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    // JSON passes the content-type guard and stops at the session guard
    let req = test::TestRequest::post()
        .uri("/api/periode")
        .set_json(serde_json::json!({ "year": 2025, "month": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_blocked_client_gets_429_before_database_access() {
    let limiter = RateLimiter::new(1, Duration::from_secs(60));
    limiter.record_failure("10.0.0.9".parse().expect("ip"));
    let app = api_app!(lazy_pool(), limiter);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .peer_addr("10.0.0.9:5000".parse().expect("addr"))
        .set_json(serde_json::json!({ "email": "x@test.local", "password": "whatever" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[actix_rt::test]
async fn test_login_me_logout_flow() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool().clone();
    let pondok_id = seed_verified_pondok(&pool, "Al Hikmah").await;
    seed_user(&pool, "hikmah@test.local", Role::AdminPondok, Some(pondok_id)).await;
    let pollers = SessionPollers::new(Duration::from_secs(60), Duration::from_secs(600));
    let app = api_app!(pool.clone(), RateLimiter::default(), pollers.clone());

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({ "email": "hikmah@test.local", "password": "salah" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({ "email": "Hikmah@test.local", "password": TEST_PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "id")
        .expect("session cookie")
        .into_owned();

    assert_eq!(pollers.len(), 1);

    // Logging in again on the same session replaces its poller
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .cookie(cookie.clone())
        .set_json(serde_json::json!({ "email": "hikmah@test.local", "password": TEST_PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(pollers.len(), 1);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "id")
        .expect("renewed session cookie")
        .into_owned();

    let req = test::TestRequest::get().uri("/api/auth/me").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(me["email"], "hikmah@test.local");

    // Branch admins cannot reach central routes
    let req = test::TestRequest::get().uri("/api/pusat/pondok").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/auth/logout")
        .cookie(cookie)
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(pollers.is_empty());
    let cleared = resp.response().cookies().find(|c| c.name() == "id").expect("removal cookie");
    assert_eq!(cleared.value(), "");

    let actions: Vec<String> = sqlx::query_scalar("SELECT action FROM audit_log ORDER BY id")
        .fetch_all(&pool)
        .await
        .expect("audit");
    assert_eq!(actions, vec!["auth.login".to_string(), "auth.login".to_string()]);
}
