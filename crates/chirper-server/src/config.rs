use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("CHIRPER_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("CHIRPER_JWT_SECRET is unset or still a placeholder");
        }

        let db_path = get("CHIRPER_DB_PATH").unwrap_or_else(|| "chirper.db".into()).into();
        let host = get("CHIRPER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("CHIRPER_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("CHIRPER_PORT is not a port number")?;
        let addr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", host, port))?;

        Ok(Self { jwt_secret, db_path, addr })
    }
}
