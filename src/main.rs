use std::time::Duration;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};

use anggaran::api_types::ApiErrorResponse;
use anggaran::auth::rate_limit::RateLimiter;
use anggaran::config::AppConfig;
use anggaran::models::periode::PeriodRegistry;
use anggaran::notifications::{SessionPollers, poller::DEFAULT_MAX_LIFETIME};
use anggaran::{audit, db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    let pool = db::init_pool(&config).await.map_err(std::io::Error::other)?;
    db::run_migrations(&pool).await.map_err(std::io::Error::other)?;
    db::seed_admin(&pool, &config.admin_email, &config.admin_password)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    // Clean up old audit entries based on retention policy
    if let Err(e) = audit::cleanup_old_entries(&pool).await {
        log::warn!("Audit cleanup failed: {e}");
    }

    // Session encryption key: SESSION_KEY keeps sessions valid across restarts
    let secret_key = match config.session_key.as_deref() {
        Some(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Some(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+); generating random key", val.len());
            Key::generate()
        }
        None => {
            log::warn!("No SESSION_KEY set; generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    let registry = web::Data::new(PeriodRegistry::new(config.current_period_policy, config.utc_offset));
    let pollers = web::Data::new(SessionPollers::new(
        Duration::from_secs(config.notification_poll_secs),
        DEFAULT_MAX_LIFETIME,
    ));
    let limiter = web::Data::new(RateLimiter::default());
    let pool = web::Data::new(pool);
    let bind_addr = config.bind_addr.clone();
    let config = web::Data::new(config);

    log::info!(
        "Starting server at http://{bind_addr} (current period policy: {:?})",
        config.current_period_policy
    );

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
            .cookie_secure(false)
            .cookie_http_only(true)
            .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(pool.clone())
            .app_data(registry.clone())
            .app_data(pollers.clone())
            .app_data(limiter.clone())
            .app_data(config.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let body = ApiErrorResponse::new("Invalid JSON body").with_details(serde_json::json!(err.to_string()));
                actix_web::error::InternalError::from_response(err, actix_web::HttpResponse::BadRequest().json(body))
                    .into()
            }))
            .configure(handlers::configure)
            // Default 404 handler (must be registered last)
            .default_service(web::to(|| async {
                actix_web::HttpResponse::NotFound().json(ApiErrorResponse::new("Not found"))
            }))
    })
    .bind(bind_addr)?
    .run()
    .await
}
