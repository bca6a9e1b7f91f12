//! Runtime configuration, read from the environment (and an optional `.env`).

use std::{net::SocketAddr, path::PathBuf};

use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://prompt-library.db";
pub const DEFAULT_OWNER_ID: &str = "user-y2r2japwz";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_CONTENT_DIR: &str = "content";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub content_dir: PathBuf,
    /// Pseudo-user every prompt belongs to.
    pub owner_id: String,
    /// Lowercase hex SHA-256 of the admin password. `None` disables login.
    pub admin_password_hash: Option<String>,
    pub session_secret: Vec<u8>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("content_dir", &self.content_dir)
            .field("owner_id", &self.owner_id)
            .field("admin_password_hash", &self.admin_password_hash.as_ref().map(|_| "<set>"))
            .field("session_secret", &"<redacted>")
            .finish()
    }
}

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn random_secret() -> Vec<u8> {
    let mut secret = vec![0u8; 32];
    rand::rng().fill_bytes(&mut secret);
    secret
}

impl Config {
    /// Reads the configuration from environment variables, loading `.env`
    /// first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let admin_password_hash = match (get("ADMIN_PASSWORD_HASH"), get("ADMIN_PASSWORD")) {
            (Some(hash), _) => {
                let hash = hash.trim().to_lowercase();
                if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(ConfigError::Invalid {
                        name: "ADMIN_PASSWORD_HASH",
                        reason: "expected 64 hex characters (SHA-256)".to_string(),
                    });
                }
                Some(hash)
            }
            (None, Some(password)) => Some(hash_password(&password)),
            (None, None) => {
                warn!("Neither ADMIN_PASSWORD_HASH nor ADMIN_PASSWORD is set - admin login is disabled");
                None
            }
        };

        let session_secret = match get("SESSION_SECRET") {
            Some(secret) => secret.into_bytes(),
            None => {
                warn!("SESSION_SECRET not set - using a random secret, sessions end on restart");
                random_secret()
            }
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            content_dir: get("CONTENT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIR)),
            owner_id: get("OWNER_ID").unwrap_or_else(|| DEFAULT_OWNER_ID.to_string()),
            admin_password_hash,
            session_secret,
        })
    }

    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: "HOST",
                reason: e.to_string(),
            })
    }
}
