use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    auth::AuthError, category_directory::CategoryError, prompt_repository::PromptError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Prompt(PromptError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Prompt(PromptError::EmptyTitle) => StatusCode::BAD_REQUEST,
            ApiError::Prompt(PromptError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Category(err) => match err {
                CategoryError::NotFound => StatusCode::NOT_FOUND,
                CategoryError::EmptyLabel => StatusCode::BAD_REQUEST,
                CategoryError::DuplicateLabel(_)
                | CategoryError::DefaultProtected
                | CategoryError::InUse(_) => StatusCode::CONFLICT,
                CategoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Auth(AuthError::InvalidPassword) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::LoginDisabled) => StatusCode::FORBIDDEN,
            ApiError::Auth(AuthError::Token(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }

        let body = ApiResponse::<()>::error(&self.to_string());
        (status, Json(body)).into_response()
    }
}
