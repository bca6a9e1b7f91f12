use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use services::services::{
    auth::{SESSION_STORAGE_KEY, Session},
    permissions::{RoleDisplay, UserPermissions},
};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::AuthSession};

#[derive(Debug, Deserialize, TS)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct AuthStatus {
    pub session: Session,
    pub permissions: UserPermissions,
    pub display: RoleDisplay,
}

impl From<Session> for AuthStatus {
    fn from(session: Session) -> Self {
        Self {
            permissions: session.permissions(),
            display: session.role.display(),
            session,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct LoginResponse {
    pub token: String,
    /// Key the client keeps `token` under.
    pub storage_key: String,
    pub status: AuthStatus,
}

/// POST /api/auth/login
pub async fn login(
    State(deployment): State<DeploymentImpl>,
    axum::Json(payload): axum::Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<LoginResponse>>, ApiError> {
    let issued = deployment.sessions().login(&payload.password)?;
    Ok(ResponseJson(ApiResponse::success(LoginResponse {
        token: issued.token,
        storage_key: SESSION_STORAGE_KEY.to_string(),
        status: issued.session.into(),
    })))
}

/// POST /api/auth/logout
/// Revokes the presented token; always answers with the viewer status
pub async fn logout(
    State(deployment): State<DeploymentImpl>,
    auth: AuthSession,
) -> ResponseJson<ApiResponse<AuthStatus>> {
    if let Some(token) = auth.token.as_deref() {
        deployment.sessions().logout(token);
    }
    ResponseJson(ApiResponse::success(Session::viewer().into()))
}

/// GET /api/auth/status
pub async fn status(auth: AuthSession) -> ResponseJson<ApiResponse<AuthStatus>> {
    ResponseJson(ApiResponse::success(auth.session.into()))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/login", post(login))
            .route("/logout", post(logout))
            .route("/status", get(status)),
    )
}
