use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use deployment::Deployment;
use services::services::{auth::Session, permissions::Capability};
use tracing::warn;

use crate::{DeploymentImpl, error::ApiError};

/// The session behind the request's `Authorization: Bearer` token. Missing
/// and unusable tokens yield the viewer session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session: Session,
    pub token: Option<String>,
}

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl AuthSession {
    /// Fails with `403` unless the session grants `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        if self.session.permissions().allows(capability) {
            return Ok(());
        }
        warn!(%capability, role = %self.session.role, "Permission denied");
        Err(ApiError::Forbidden(format!(
            "admin permission required to {capability}"
        )))
    }
}

impl FromRequestParts<DeploymentImpl> for AuthSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        deployment: &DeploymentImpl,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers);
        let session = match token.as_deref() {
            Some(token) => deployment.sessions().resolve(token),
            None => Session::viewer(),
        };
        Ok(Self { session, token })
    }
}
