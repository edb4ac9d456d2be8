use std::{env, path::PathBuf, time::Duration};

use anyhow::Context;

use crate::query::DEFAULT_CACHE_TTL;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// When set, tables live in Postgres instead of local storage.
    pub database_url: Option<String>,
    /// JSON file backing local storage; in-memory when absent.
    pub storage_path: Option<PathBuf>,
    pub storage_secret: String,
    pub jwt_secret: String,
    pub admin_email: String,
    pub admin_password: String,
    pub query_cache_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let storage_secret = match env::var("STORAGE_SECRET") {
            Ok(secret) => secret,
            Err(_) if cfg!(debug_assertions) => {
                tracing::warn!("STORAGE_SECRET is not set, using a development key");
                "yapee-dev-storage-key".to_string()
            }
            Err(err) => return Err(err).context("STORAGE_SECRET is not set"),
        };

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let query_cache_ttl = env::var("QUERY_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_TTL);

        Ok(Self {
            host,
            port,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            storage_path: env::var("STORAGE_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            storage_secret,
            jwt_secret,
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@elitestore.com".into()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into()),
            query_cache_ttl,
        })
    }

    /// In-memory configuration with explicit secrets, used by tests and tools.
    pub fn with_secrets(storage_secret: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: None,
            storage_path: None,
            storage_secret: storage_secret.into(),
            jwt_secret: jwt_secret.into(),
            admin_email: "admin@elitestore.com".into(),
            admin_password: "admin123".into(),
            query_cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}
