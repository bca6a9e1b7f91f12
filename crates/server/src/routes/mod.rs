use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::DeploymentImpl;

pub mod auth;
pub mod categories;
pub mod chapters;
pub mod health;
pub mod prompts;

pub fn router(deployment: DeploymentImpl) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .merge(prompts::router(&deployment))
        .merge(categories::router(&deployment))
        .merge(auth::router(&deployment))
        .merge(chapters::router(&deployment));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(deployment)
}
