use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::prompt::{CreatePrompt, Prompt, UpdatePrompt};
use deployment::Deployment;
use services::services::{
    levels::{self, LevelGroup},
    permissions::Capability,
    prompt_repository::{ImportSummary, PromptMutation, PromptQuery},
};
use uuid::Uuid;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::AuthSession};

/// GET /api/prompts
/// Filtered and sorted listing; a failed read is an empty list with a message
pub async fn list_prompts(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<PromptQuery>,
) -> ResponseJson<ApiResponse<Vec<Prompt>>> {
    let listing = deployment.prompts().list(&query).await;
    match listing.error {
        Some(message) => ResponseJson(ApiResponse::success_with_message(listing.prompts, message)),
        None => ResponseJson(ApiResponse::success(listing.prompts)),
    }
}

/// GET /api/prompts/levels
pub async fn list_prompts_by_level(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<PromptQuery>,
) -> ResponseJson<ApiResponse<Vec<LevelGroup>>> {
    let listing = deployment.prompts().list(&query).await;
    let groups = levels::group(&listing.prompts);
    match listing.error {
        Some(message) => ResponseJson(ApiResponse::success_with_message(groups, message)),
        None => ResponseJson(ApiResponse::success(groups)),
    }
}

/// GET /api/prompts/{id}
pub async fn get_prompt(
    State(deployment): State<DeploymentImpl>,
    Path(prompt_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Prompt>>, ApiError> {
    let prompt = deployment.prompts().get(prompt_id).await?;
    Ok(ResponseJson(ApiResponse::success(prompt)))
}

/// POST /api/prompts
/// Answers with the new prompt and the refreshed listing
pub async fn create_prompt(
    State(deployment): State<DeploymentImpl>,
    auth: AuthSession,
    axum::Json(payload): axum::Json<CreatePrompt>,
) -> Result<ResponseJson<ApiResponse<PromptMutation>>, ApiError> {
    auth.require(Capability::Create)?;
    let created = deployment.prompts().create(payload).await?;
    Ok(ResponseJson(ApiResponse::success(created)))
}

/// POST /api/prompts/import
/// Bulk create, skipping titles the library already has
pub async fn import_prompts(
    State(deployment): State<DeploymentImpl>,
    auth: AuthSession,
    axum::Json(payload): axum::Json<Vec<CreatePrompt>>,
) -> Result<ResponseJson<ApiResponse<ImportSummary>>, ApiError> {
    auth.require(Capability::Create)?;
    let summary = deployment.prompts().import(payload).await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

/// PUT /api/prompts/{id}
/// Partial update; only the provided fields change
pub async fn update_prompt(
    State(deployment): State<DeploymentImpl>,
    Path(prompt_id): Path<Uuid>,
    auth: AuthSession,
    axum::Json(payload): axum::Json<UpdatePrompt>,
) -> Result<ResponseJson<ApiResponse<PromptMutation>>, ApiError> {
    auth.require(Capability::Update)?;
    let updated = deployment.prompts().update(prompt_id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// DELETE /api/prompts/{id}
/// Answers with the remaining prompts
pub async fn delete_prompt(
    State(deployment): State<DeploymentImpl>,
    Path(prompt_id): Path<Uuid>,
    auth: AuthSession,
) -> Result<ResponseJson<ApiResponse<Vec<Prompt>>>, ApiError> {
    auth.require(Capability::Delete)?;
    let remaining = deployment.prompts().delete(prompt_id).await?;
    Ok(ResponseJson(ApiResponse::success(remaining)))
}

/// POST /api/prompts/{id}/favorite
pub async fn toggle_favorite(
    State(deployment): State<DeploymentImpl>,
    Path(prompt_id): Path<Uuid>,
    auth: AuthSession,
) -> Result<ResponseJson<ApiResponse<PromptMutation>>, ApiError> {
    auth.require(Capability::ToggleFavorite)?;
    let toggled = deployment.prompts().toggle_favorite(prompt_id).await?;
    Ok(ResponseJson(ApiResponse::success(toggled)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/prompts",
        Router::new()
            .route("/", get(list_prompts).post(create_prompt))
            .route("/levels", get(list_prompts_by_level))
            .route("/import", post(import_prompts))
            .route(
                "/{id}",
                get(get_prompt).put(update_prompt).delete(delete_prompt),
            )
            .route("/{id}/favorite", post(toggle_favorite)),
    )
}
