use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use services::services::study_guide::{AdjacentChapters, Chapter};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct ChapterDetail {
    pub chapter: Chapter,
    pub adjacent: AdjacentChapters,
}

/// GET /api/chapters
/// Ordered by chapter number
pub async fn list_chapters(
    State(deployment): State<DeploymentImpl>,
) -> ResponseJson<ApiResponse<Vec<Chapter>>> {
    let chapters = deployment.study_guide().list_chapters().await;
    ResponseJson(ApiResponse::success(chapters))
}

/// GET /api/chapters/{slug}
/// The chapter with its neighbours
pub async fn get_chapter(
    State(deployment): State<DeploymentImpl>,
    Path(slug): Path<String>,
) -> Result<ResponseJson<ApiResponse<ChapterDetail>>, ApiError> {
    let guide = deployment.study_guide();
    let chapter = guide
        .get_chapter(&slug)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("chapter '{slug}' not found")))?;
    let adjacent = guide.adjacent(&slug).await;
    Ok(ResponseJson(ApiResponse::success(ChapterDetail { chapter, adjacent })))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/chapters",
        Router::new()
            .route("/", get(list_chapters))
            .route("/{slug}", get(get_chapter)),
    )
}
