use anyhow::Context;
use deployment::Deployment;
use server::{DeploymentImpl, routes};
use services::services::auth::SessionSweeper;
use tracing::info;
use utils::tracing_init::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let deployment = DeploymentImpl::new()
        .await
        .context("failed to start the prompt library")?;
    let _sweeper = SessionSweeper::spawn(deployment.sessions().clone());

    let addr = deployment.config().bind_address()?;
    let app = routes::router(deployment);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server running on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
