use chrono::{FixedOffset, Offset, Utc};
use std::env;

use crate::constants::{DEFAULT_SIGN_IN_URL, MAX_PAGE_SIZE, MAX_UTC_OFFSET_MINUTES};

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Session tokens from the identity provider
    pub session_jwt_secret: Option<String>,
    pub session_jwt_public_key: Option<String>,
    pub session_jwt_issuer: Option<String>,
    pub sign_in_url: String,

    // Listing
    pub max_page_size: u32,

    // Quota day bucketing
    pub quota_utc_offset_minutes: i32,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,

            session_jwt_secret: non_empty_var("SESSION_JWT_SECRET"),
            session_jwt_public_key: non_empty_var("SESSION_JWT_PUBLIC_KEY"),
            session_jwt_issuer: non_empty_var("SESSION_JWT_ISSUER"),
            sign_in_url: env::var("SIGN_IN_URL").unwrap_or_else(|_| DEFAULT_SIGN_IN_URL.to_string()),

            max_page_size: env::var("MAX_PAGE_SIZE")
                .unwrap_or_else(|_| MAX_PAGE_SIZE.to_string())
                .parse()?,

            quota_utc_offset_minutes: env::var("QUOTA_UTC_OFFSET_MINUTES")
                .unwrap_or_else(|_| "0".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.session_jwt_secret.is_none() && self.session_jwt_public_key.is_none() {
            anyhow::bail!("Either SESSION_JWT_SECRET or SESSION_JWT_PUBLIC_KEY must be set");
        }
        if self.max_page_size == 0 {
            anyhow::bail!("MAX_PAGE_SIZE must be > 0");
        }
        if self.quota_utc_offset_minutes.abs() >= MAX_UTC_OFFSET_MINUTES {
            anyhow::bail!(
                "QUOTA_UTC_OFFSET_MINUTES must be within +/-{} minutes",
                MAX_UTC_OFFSET_MINUTES - 1
            );
        }

        if self.session_jwt_secret.is_some() && self.session_jwt_public_key.is_some() {
            tracing::warn!("Both session keys configured; SESSION_JWT_PUBLIC_KEY takes precedence");
        }
        if let Some(secret) = &self.session_jwt_secret {
            if secret.len() < 32 {
                tracing::warn!("SESSION_JWT_SECRET is shorter than 32 bytes");
            }
        }
        if self.max_page_size > MAX_PAGE_SIZE {
            tracing::warn!(
                "MAX_PAGE_SIZE {} exceeds recommended maximum {}",
                self.max_page_size,
                MAX_PAGE_SIZE
            );
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    /// Reference clock used to decide which calendar day a request belongs to.
    pub fn quota_clock_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.quota_utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        environment: "test".to_string(),
        database_url: "postgres://localhost/dashboard_test".to_string(),
        database_max_connections: 1,
        session_jwt_secret: Some("test_session_secret_with_enough_bytes".to_string()),
        session_jwt_public_key: None,
        session_jwt_issuer: None,
        sign_in_url: DEFAULT_SIGN_IN_URL.to_string(),
        max_page_size: MAX_PAGE_SIZE,
        quota_utc_offset_minutes: 0,
        cors_allowed_origins: "*".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_test_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn validate_requires_a_session_key() {
        let mut config = test_config();
        config.session_jwt_secret = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_page_size() {
        let mut config = test_config();
        config.max_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_offset_of_a_full_day() {
        let mut config = test_config();
        config.quota_utc_offset_minutes = -24 * 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn quota_clock_offset_uses_minutes() {
        let mut config = test_config();
        config.quota_utc_offset_minutes = -300;
        assert_eq!(config.quota_clock_offset().local_minus_utc(), -300 * 60);
    }
}
