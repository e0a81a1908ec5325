use std::env;

use anyhow::{Context, bail};

/// JWT signing configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Access-token lifetime in minutes.
    pub access_token_expiry_minutes: i64,
    /// Refresh-token lifetime in days.
    pub refresh_token_expiry_days: i64,
}

impl JwtConfig {
    /// Loads the configuration from the environment. The process must refuse
    /// to start without a usable secret, so a missing or empty
    /// `JWT_SECRET_KEY` is a startup error rather than a per-request one.
    pub fn from_env() -> anyhow::Result<Self> {
        let secret =
            env::var("JWT_SECRET_KEY").context("JWT_SECRET_KEY must be set")?;
        if secret.trim().is_empty() {
            bail!("JWT_SECRET_KEY must not be empty");
        }

        Ok(Self {
            secret,
            access_token_expiry_minutes: env::var("JWT_ACCESS_EXPIRY_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(360),
            refresh_token_expiry_days: env::var("JWT_REFRESH_EXPIRY_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(7),
        })
    }
}
