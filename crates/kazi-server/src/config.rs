use anyhow::{Context, Result};

/// Server configuration, read from the environment exactly once at startup
/// and passed down explicitly; nothing else in the workspace touches env
/// vars.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            host: std::env::var("KAZI_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("KAZI_PORT")
                .unwrap_or_else(|_| "3000".into())
                .parse()
                .context("KAZI_PORT must be a valid port number")?,
            db_path: std::env::var("KAZI_DB_PATH").unwrap_or_else(|_| "kazi.db".into()),
            jwt_secret: std::env::var("KAZI_JWT_SECRET")
                .unwrap_or_else(|_| "dev-secret-change-me".into()),
        })
    }
}
