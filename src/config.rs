use chrono::FixedOffset;

use crate::models::periode::CurrentPeriodPolicy;

/// Runtime configuration, read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub session_key: Option<String>,
    pub db_max_connections: u32,
    pub current_period_policy: CurrentPeriodPolicy,
    pub utc_offset: FixedOffset,
    pub notification_poll_secs: u64,
    pub storage_public_base_url: String,
    pub admin_email: String,
    pub admin_password: String,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "Missing required environment variable {key}"),
            ConfigError::Invalid { key, value } => write!(f, "Invalid value for {key}: '{value}'"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let current_period_policy = match lookup("CURRENT_PERIOD_POLICY") {
            Some(v) => v
                .parse::<CurrentPeriodPolicy>()
                .map_err(|_| ConfigError::Invalid { key: "CURRENT_PERIOD_POLICY", value: v })?,
            None => CurrentPeriodPolicy::default(),
        };

        let offset_hours: i32 = parse_or(&lookup, "APP_UTC_OFFSET_HOURS", 7)?;
        let utc_offset = FixedOffset::east_opt(offset_hours * 3600).ok_or(ConfigError::Invalid {
            key: "APP_UTC_OFFSET_HOURS",
            value: offset_hours.to_string(),
        })?;

        let notification_poll_secs: u64 = parse_or(&lookup, "NOTIFICATION_POLL_SECS", 60)?;
        if notification_poll_secs == 0 {
            return Err(ConfigError::Invalid { key: "NOTIFICATION_POLL_SECS", value: "0".into() });
        }

        Ok(AppConfig {
            database_url,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            session_key: lookup("SESSION_KEY"),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 8)?,
            current_period_policy,
            utc_offset,
            notification_poll_secs,
            storage_public_base_url: lookup("STORAGE_PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8080/files".to_string()),
            admin_email: lookup("ADMIN_EMAIL").unwrap_or_else(|| "admin@pusat.local".to_string()),
            admin_password: lookup("ADMIN_PASSWORD").unwrap_or_else(|| "admin123".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(v) => v.trim().parse::<T>().map_err(|_| ConfigError::Invalid { key, value: v }),
        None => Ok(default),
    }
}
