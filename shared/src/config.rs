//! Configuration loaded from the process environment

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};

const DEFAULT_MAX_UPLOAD_MB: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub uploads_dir: PathBuf,
    pub client_url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub statement_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub command: String,
    pub language: String,
    pub timeout: Duration,
}

impl Config {
    /// Reads `.env` (if any) and then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// `UPLOADS_DIR` is the only required setting; everything else has a
    /// default so a local checkout starts without ceremony.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let uploads_dir = var("UPLOADS_DIR")
            .map(PathBuf::from)
            .ok_or_else(|| AppError::configuration("Missing upload directory path"))?;

        let max_upload_mb: usize = parse_or(var("MAX_UPLOAD_MB"), "MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB);
        let max_upload_bytes = max_upload_mb.checked_mul(1024 * 1024).unwrap_or_else(|| {
            tracing::warn!(
                "MAX_UPLOAD_MB {} is out of range, falling back to {}",
                max_upload_mb,
                DEFAULT_MAX_UPLOAD_MB
            );
            DEFAULT_MAX_UPLOAD_MB * 1024 * 1024
        });

        Ok(Config {
            server: ServerConfig {
                port: parse_or(var("PORT"), "PORT", 8000),
                uploads_dir,
                client_url: var("CLIENT_URL").unwrap_or_else(|| "http://localhost:3000".to_string()),
                max_upload_bytes,
            },
            database: DatabaseConfig {
                host: var("MYSQL_HOST").unwrap_or_else(|| "localhost".to_string()),
                port: parse_or(var("MYSQL_PORT"), "MYSQL_PORT", 3306),
                user: var("MYSQL_USER").unwrap_or_else(|| "root".to_string()),
                password: var("MYSQL_PASS").unwrap_or_default(),
                database: var("MYSQL_DB").unwrap_or_else(|| "inventory".to_string()),
                max_connections: parse_or(var("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 10),
                acquire_timeout: Duration::from_secs(parse_or(
                    var("DB_ACQUIRE_TIMEOUT_SECS"),
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    5,
                )),
                statement_timeout: Duration::from_secs(parse_or(
                    var("DB_STATEMENT_TIMEOUT_SECS"),
                    "DB_STATEMENT_TIMEOUT_SECS",
                    10,
                )),
            },
            auth: AuthConfig {
                jwt_secret: var("JWT_SECRET").unwrap_or_else(|| {
                    tracing::warn!("JWT_SECRET not set, tokens will not survive a restart");
                    ephemeral_secret()
                }),
                token_ttl: Duration::from_secs(parse_or(var("JWT_TTL_SECS"), "JWT_TTL_SECS", 86_400)),
                bcrypt_cost: parse_or(var("BCRYPT_COST"), "BCRYPT_COST", bcrypt::DEFAULT_COST),
            },
            ocr: OcrConfig {
                command: var("OCR_COMMAND").unwrap_or_else(|| "tesseract".to_string()),
                language: var("OCR_LANG").unwrap_or_else(|| "eng".to_string()),
                timeout: Duration::from_secs(parse_or(var("OCR_TIMEOUT_SECS"), "OCR_TIMEOUT_SECS", 120)),
            },
        })
    }
}

/// Random per-process signing secret for when none is configured.
fn ephemeral_secret() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value '{}' for {}, falling back to {}", value, key, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn missing_uploads_dir_is_fatal() {
        let err = config_from(&[("PORT", "9000")]).unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
        assert_eq!(err.to_string(), "Missing upload directory path");
    }

    #[test]
    fn blank_uploads_dir_counts_as_missing() {
        assert!(config_from(&[("UPLOADS_DIR", "  ")]).is_err());
    }

    #[test]
    fn defaults_apply_when_only_uploads_dir_is_set() {
        let config = config_from(&[("UPLOADS_DIR", "/tmp/uploads")]).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.uploads_dir, PathBuf::from("/tmp/uploads"));
        assert_eq!(config.server.client_url, "http://localhost:3000");
        assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.command, "tesseract");
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = config_from(&[
            ("UPLOADS_DIR", "/srv/uploads"),
            ("PORT", "8081"),
            ("CLIENT_URL", "https://app.example.com"),
            ("MYSQL_HOST", "db.internal"),
            ("MYSQL_PORT", "3307"),
            ("MYSQL_USER", "api"),
            ("MYSQL_PASS", "secret"),
            ("MYSQL_DB", "stock"),
            ("DB_STATEMENT_TIMEOUT_SECS", "3"),
            ("OCR_LANG", "spa"),
        ])
        .unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.client_url, "https://app.example.com");
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 3307);
        assert_eq!(config.database.user, "api");
        assert_eq!(config.database.password, "secret");
        assert_eq!(config.database.database, "stock");
        assert_eq!(config.database.statement_timeout, Duration::from_secs(3));
        assert_eq!(config.ocr.language, "spa");
    }

    #[test]
    fn unparseable_numbers_fall_back_to_defaults() {
        let config = config_from(&[("UPLOADS_DIR", "/tmp/u"), ("PORT", "eighty")]).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn oversized_upload_limit_falls_back_to_default() {
        let config = config_from(&[
            ("UPLOADS_DIR", "/tmp/u"),
            ("MAX_UPLOAD_MB", "18446744073709551615"),
        ])
        .unwrap();
        assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);

        let config = config_from(&[("UPLOADS_DIR", "/tmp/u"), ("MAX_UPLOAD_MB", "1")]).unwrap();
        assert_eq!(config.server.max_upload_bytes, 1024 * 1024);
    }

    #[test]
    fn missing_jwt_secret_is_random_per_config() {
        let first = config_from(&[("UPLOADS_DIR", "/tmp/u")]).unwrap();
        let second = config_from(&[("UPLOADS_DIR", "/tmp/u")]).unwrap();
        assert_eq!(first.auth.jwt_secret.len(), 64);
        assert_ne!(first.auth.jwt_secret, second.auth.jwt_secret);

        let configured = config_from(&[("UPLOADS_DIR", "/tmp/u"), ("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(configured.auth.jwt_secret, "s3cret");
    }
}
