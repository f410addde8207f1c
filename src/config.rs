use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use zeroize::Zeroizing;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The URL of the Redis server. When unset, sessions live in process
    /// memory and do not survive a restart.
    pub redis_url: Option<String>,
    /// The symmetric secret used to sign bearer tokens.
    pub jwt_secret: Zeroizing<String>,
    /// The issuer stamped into bearer tokens.
    pub jwt_issuer: String,
    /// Bearer token lifetime in hours.
    pub jwt_expire_hours: i64,
    /// The name of the session cookie.
    pub session_cookie: String,
    /// Session lifetime; also the cookie max-age.
    pub session_max_age: Duration,
    /// The address the server binds to.
    pub server_addr: SocketAddr,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters");
        }

        let session_max_age_secs: u64 = env::var("SESSION_MAX_AGE_SECS")
            .unwrap_or_else(|_| "600".to_string())
            .parse()
            .context("Invalid SESSION_MAX_AGE_SECS")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret: Zeroizing::new(jwt_secret),
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "scribe".to_string()),
            jwt_expire_hours: env::var("JWT_EXPIRE_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .context("Invalid JWT_EXPIRE_HOURS")?,
            session_cookie: env::var("SESSION_COOKIE")
                .unwrap_or_else(|_| "session_id".to_string()),
            session_max_age: Duration::from_secs(session_max_age_secs),
            server_addr: env::var("SERVER_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
                .parse()
                .context("Invalid SERVER_ADDR")?,
        })
    }
}
