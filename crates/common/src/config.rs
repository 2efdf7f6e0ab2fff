//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Default number of history messages returned when the caller gives no limit
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Upper bound for a single history page
pub const MAX_HISTORY_LIMIT: i64 = 200;

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL. Absent means the in-memory store is used.
    pub database_url: Option<String>,

    /// Bearer token validation
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,

    /// Comma-separated list of allowed CORS origins; absent means permissive
    pub cors_allowed_origins: Option<String>,

    /// History paging bounds
    pub history_default_limit: i64,
    pub history_max_limit: i64,

    /// Runtime configuration
    pub rust_log: String,
    pub log_format: String,
    pub port: u16,
}

impl std::fmt::Debug for Config {
    #[mutants::skip] // Redaction only; covered by test_config_debug_redacts_secrets
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_audience", &self.jwt_audience)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("history_default_limit", &self.history_default_limit)
            .field("history_max_limit", &self.history_max_limit)
            .field("rust_log", &self.rust_log)
            .field("log_format", &self.log_format)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let history_max_limit = parse_or("HISTORY_MAX_LIMIT", MAX_HISTORY_LIMIT).max(1);
        let history_default_limit =
            parse_or("HISTORY_DEFAULT_LIMIT", DEFAULT_HISTORY_LIMIT).clamp(1, history_max_limit);

        let config = Self {
            database_url: non_empty_var("DATABASE_URL"),

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET is required"))?,
            jwt_issuer: non_empty_var("JWT_ISSUER"),
            jwt_audience: non_empty_var("JWT_AUDIENCE"),

            cors_allowed_origins: non_empty_var("CORS_ALLOWED_ORIGINS"),

            history_default_limit,
            history_max_limit,

            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "tokochat=debug".to_string()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            port: parse_or("PORT", 3000),
        };

        Ok(config)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
