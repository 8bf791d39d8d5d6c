//! Shared test infrastructure for model and service tests.
//!
//! Every test gets its own throwaway Postgres database, created from the
//! server in `DATABASE_URL` and dropped again when the `TestDb` goes out of
//! scope. Without `DATABASE_URL` the database-backed tests return early.
#![allow(dead_code)]

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, Connection, PgConnection, PgPool};

use anggaran::auth::password;
use anggaran::models::periode::{self, CurrentPeriodPolicy, PeriodRegistry, Periode, PeriodeForm};
use anggaran::models::pondok::{self, PondokForm};
use anggaran::models::user::{self, NewUser, Role};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const TEST_PASSWORD: &str = "rahasia123";

// ============================================================================
// DATABASE SETUP
// ============================================================================

pub struct TestDb {
    pool: PgPool,
    name: String,
    admin_options: PgConnectOptions,
}

impl TestDb {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let name = std::mem::take(&mut self.name);
        let options = self.admin_options.clone();
        // Drop is sync: the database is dropped from a private runtime.
        let _ = std::thread::spawn(move || {
            let Ok(rt) = tokio::runtime::Builder::new_current_thread().enable_all().build() else {
                return;
            };
            rt.block_on(async move {
                if let Ok(mut conn) = options.connect().await {
                    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{name}\" WITH (FORCE)"))
                        .execute(&mut conn)
                        .await;
                    let _ = conn.close().await;
                }
            });
        })
        .join();
    }
}

/// Create a fresh, migrated database. `None` when `DATABASE_URL` is not set.
pub async fn setup_test_db() -> Option<TestDb> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let admin_options = PgConnectOptions::from_str(&url).expect("Invalid DATABASE_URL");

    let token = anggaran::auth::session::generate_token();
    let name = format!("anggaran_test_{}", &token[..16]);
    let mut admin = PgConnection::connect_with(&admin_options)
        .await
        .expect("Failed to connect to DATABASE_URL");
    sqlx::query(&format!("CREATE DATABASE \"{name}\""))
        .execute(&mut admin)
        .await
        .expect("Failed to create test database");
    admin.close().await.ok();

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect_with(admin_options.clone().database(&name))
        .await
        .expect("Failed to connect to test database");
    anggaran::db::run_migrations(&pool).await.expect("Failed to run migrations");

    Some(TestDb { pool, name, admin_options })
}

// ============================================================================
// CLOCK AND PERIODS
// ============================================================================

pub fn wib() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).expect("valid offset")
}

pub fn registry() -> PeriodRegistry {
    PeriodRegistry::new(CurrentPeriodPolicy::Calendar, wib())
}

/// A local (UTC+7) wall-clock time as a UTC instant.
pub fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> DateTime<Utc> {
    wib()
        .with_ymd_and_hms(y, m, d, hh, mm, 0)
        .single()
        .expect("valid local time")
        .with_timezone(&Utc)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Period 2025-01: RAB window Jan 1-10, LPJ window Jan 20-31.
pub async fn seed_period_202501(pool: &PgPool) -> Periode {
    periode::create(
        pool,
        &PeriodeForm {
            year: 2025,
            month: 1,
            rab_start: date(2025, 1, 1),
            rab_end: date(2025, 1, 10),
            lpj_start: date(2025, 1, 20),
            lpj_end: date(2025, 1, 31),
        },
    )
    .await
    .expect("create period")
}

/// Inside the RAB window of period 2025-01.
pub fn rab_time() -> DateTime<Utc> {
    at(2025, 1, 5, 10, 0)
}

/// Inside the LPJ window of period 2025-01.
pub fn lpj_time() -> DateTime<Utc> {
    at(2025, 1, 25, 10, 0)
}

// ============================================================================
// BRANCHES AND USERS
// ============================================================================

pub fn complete_profile(name: &str) -> PondokForm {
    PondokForm {
        name: name.to_string(),
        phone: "0812 3456 7890".to_string(),
        address: "Jl. Merdeka No. 1".to_string(),
        provinsi_id: Some(32),
        kota_id: Some(3273),
        kecamatan_id: None,
        kelurahan_id: None,
        kode_pos: "40111".to_string(),
        daerah_sambung_id: None,
    }
}

/// A branch with a complete, verified profile.
pub async fn seed_verified_pondok(pool: &PgPool, name: &str) -> i64 {
    let id = seed_pondok(pool, name).await;
    pondok::update_profile(pool, id, &complete_profile(name), Utc::now())
        .await
        .expect("update profile");
    pondok::verify(pool, id, Utc::now()).await.expect("verify pondok");
    id
}

/// A freshly registered branch: name only, not verified.
pub async fn seed_pondok(pool: &PgPool, name: &str) -> i64 {
    let mut conn = pool.acquire().await.expect("acquire");
    pondok::create(&mut conn, name).await.expect("create pondok")
}

pub async fn seed_user(pool: &PgPool, email: &str, role: Role, pondok_id: Option<i64>) -> i64 {
    let mut conn = pool.acquire().await.expect("acquire");
    user::create(
        &mut conn,
        &NewUser {
            email: email.to_string(),
            password_hash: password::hash_password(TEST_PASSWORD).expect("hash"),
            name: Some(email.split('@').next().unwrap_or(email).to_string()),
            phone: None,
            role,
            pondok_id,
        },
    )
    .await
    .expect("create user")
}

pub async fn seed_pusat_admin(pool: &PgPool) -> i64 {
    seed_user(pool, "pusat@test.local", Role::AdminPusat, None).await
}
