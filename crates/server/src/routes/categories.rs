use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::category::{Category, CreateCategory, UpdateCategory};
use deployment::Deployment;
use services::services::{category_directory::CategorySnapshot, permissions::Capability};
use uuid::Uuid;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::AuthSession};

/// GET /api/categories
/// Never fails; the snapshot says whether it came from the store, the cache
/// or the built-in defaults
pub async fn list_categories(
    State(deployment): State<DeploymentImpl>,
) -> ResponseJson<ApiResponse<CategorySnapshot>> {
    let snapshot = deployment.categories().snapshot().await;
    match snapshot.error.clone() {
        Some(message) => ResponseJson(ApiResponse::success_with_message(snapshot, message)),
        None => ResponseJson(ApiResponse::success(snapshot)),
    }
}

/// POST /api/categories
/// Labels must be unique
pub async fn create_category(
    State(deployment): State<DeploymentImpl>,
    auth: AuthSession,
    axum::Json(payload): axum::Json<CreateCategory>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    auth.require(Capability::Create)?;
    let category = deployment.categories().create(payload).await?;
    Ok(ResponseJson(ApiResponse::success(category)))
}

/// PUT /api/categories/{id}
/// Seeded defaults keep their default flag
pub async fn update_category(
    State(deployment): State<DeploymentImpl>,
    Path(category_id): Path<Uuid>,
    auth: AuthSession,
    axum::Json(payload): axum::Json<UpdateCategory>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    auth.require(Capability::Update)?;
    let category = deployment.categories().update(category_id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(category)))
}

/// DELETE /api/categories/{id}
/// Refused for defaults and for categories still referenced by prompts
pub async fn delete_category(
    State(deployment): State<DeploymentImpl>,
    Path(category_id): Path<Uuid>,
    auth: AuthSession,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    auth.require(Capability::Delete)?;
    deployment.categories().delete(category_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/categories",
        Router::new()
            .route("/", get(list_categories).post(create_category))
            .route("/{id}", put(update_category).delete(delete_category)),
    )
}
