use anyhow::{Context, Result};
use tracing::warn;

/// Non-production fallback. Anything signed with it can be forged by anyone
/// who has read this file.
pub const DEFAULT_SECRET_KEY: &str = "it's a secret";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Read settings from the environment (after `.env`, if present).
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "warbler.db".into());
        let secret_key = std::env::var("SECRET_KEY").unwrap_or_default();
        let host = std::env::var("WARBLER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("WARBLER_PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .context("WARBLER_PORT must be a port number")?;

        let secret_key = if secret_key.is_empty() {
            warn!("SECRET_KEY is unset; using the development default. Set it before deploying.");
            DEFAULT_SECRET_KEY.to_string()
        } else {
            if secret_key == DEFAULT_SECRET_KEY {
                warn!("SECRET_KEY is still the development default. Set it before deploying.");
            }
            secret_key
        };

        Ok(Self {
            database_url,
            secret_key,
            host,
            port,
        })
    }
}
