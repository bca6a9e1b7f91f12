//! Password login and time-limited admin sessions.
//!
//! A session is an HS256-signed token carrying its own login time. It is
//! valid until exactly `login_time + 24h` unless it was revoked by logout.
//! Every invalid, expired or revoked token resolves to the viewer session.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tokio::time::interval;
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    config::{Config, hash_password},
    permissions::{UserPermissions, UserRole},
};

pub const SESSION_TTL_HOURS: i64 = 24;
/// Key under which clients keep the token.
pub const SESSION_STORAGE_KEY: &str = "prompt-library-session";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid password")]
    InvalidPassword,
    #[error("admin login is not configured")]
    LoginDisabled,
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Session {
    pub is_logged_in: bool,
    pub role: UserRole,
    pub login_time: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn viewer() -> Self {
        Self {
            is_logged_in: false,
            role: UserRole::Viewer,
            login_time: None,
            expires_at: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn permissions(&self) -> UserPermissions {
        self.role.permissions()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    jti: Uuid,
    role: UserRole,
    iat: i64,
    exp: i64,
    login_time: DateTime<Utc>,
}

fn session_ttl() -> chrono::Duration {
    chrono::Duration::hours(SESSION_TTL_HOURS)
}

#[derive(Clone)]
pub struct SessionManager {
    password_hash: Option<String>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    /// Revoked session ids with the instant they would have expired.
    revoked: Arc<DashMap<Uuid, DateTime<Utc>>>,
}

impl SessionManager {
    pub fn new(password_hash: Option<String>, secret: &[u8]) -> Self {
        Self {
            password_hash,
            encoding_key: Arc::new(EncodingKey::from_secret(secret)),
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            revoked: Arc::new(DashMap::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.admin_password_hash.clone(), &config.session_secret)
    }

    pub fn login(&self, password: &str) -> Result<IssuedSession, AuthError> {
        self.login_at(password, Utc::now())
    }

    /// Checks `password` and, when it matches, issues a session starting at `now`.
    pub fn login_at(&self, password: &str, now: DateTime<Utc>) -> Result<IssuedSession, AuthError> {
        let Some(expected) = self.password_hash.as_deref() else {
            warn!("Login attempted but no admin password is configured");
            return Err(AuthError::LoginDisabled);
        };

        let supplied = hash_password(password);
        if !bool::from(supplied.as_bytes().ct_eq(expected.as_bytes())) {
            warn!("Admin login rejected");
            return Err(AuthError::InvalidPassword);
        }

        let expires_at = now + session_ttl();
        let claims = SessionClaims {
            sub: "admin".to_string(),
            jti: Uuid::new_v4(),
            role: UserRole::Admin,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            login_time: now,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        info!(session_id = %claims.jti, %expires_at, "Admin session issued");
        Ok(IssuedSession {
            token,
            session: Session {
                is_logged_in: true,
                role: claims.role,
                login_time: Some(now),
                expires_at: Some(expires_at),
            },
        })
    }

    fn decode_claims(&self, token: &str) -> Result<SessionClaims, AuthError> {
        // Expiry is checked against `login_time` below, to the nanosecond.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    pub fn resolve(&self, token: &str) -> Session {
        self.resolve_at(token, Utc::now())
    }

    /// The session `token` grants at `now`.
    pub fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Session {
        let claims = match self.decode_claims(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                return Session::viewer();
            }
        };

        let expires_at = claims.login_time + session_ttl();
        if now >= expires_at {
            debug!(session_id = %claims.jti, %expires_at, "Session expired");
            return Session::viewer();
        }
        if self.revoked.contains_key(&claims.jti) {
            debug!(session_id = %claims.jti, "Session was logged out");
            return Session::viewer();
        }

        Session {
            is_logged_in: true,
            role: claims.role,
            login_time: Some(claims.login_time),
            expires_at: Some(expires_at),
        }
    }

    /// Revokes the session behind `token`. Returns false when the token was
    /// not a session we issued.
    pub fn logout(&self, token: &str) -> bool {
        match self.decode_claims(token) {
            Ok(claims) => {
                let expires_at = claims.login_time + session_ttl();
                self.revoked.insert(claims.jti, expires_at);
                info!(session_id = %claims.jti, "Admin session logged out");
                true
            }
            Err(e) => {
                debug!(error = %e, "Logout with an unusable token");
                false
            }
        }
    }

    /// Forgets revocations of sessions that have expired anyway.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let before = self.revoked.len();
        self.revoked.retain(|_, expires_at| *expires_at > now);
        before - self.revoked.len()
    }

    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }
}

/// Background task that periodically expires session revocations.
pub struct SessionSweeper {
    sessions: SessionManager,
    poll_interval: Duration,
}

impl SessionSweeper {
    pub fn spawn(sessions: SessionManager) -> tokio::task::JoinHandle<()> {
        let sweeper = Self {
            sessions,
            poll_interval: Duration::from_secs(60),
        };
        tokio::spawn(async move {
            sweeper.start().await;
        })
    }

    async fn start(&self) {
        info!("Starting session sweeper with interval {:?}", self.poll_interval);
        let mut interval = interval(self.poll_interval);
        loop {
            interval.tick().await;
            let removed = self.sessions.sweep(Utc::now());
            if removed > 0 {
                debug!(removed, "Session sweeper dropped expired revocations");
            }
        }
    }
}
