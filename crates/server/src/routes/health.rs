use axum::response::Json;
use utils::response::ApiResponse;

/// GET /api/health
pub async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success("OK".to_string()))
}
