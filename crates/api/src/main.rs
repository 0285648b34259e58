use std::sync::Arc;

use anyhow::Context;

use rentpoint_api::app::{self, services};
use rentpoint_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rentpoint_observability::init();

    let config = ApiConfig::from_env();
    tracing::info!(?config, "starting rentpoint api");

    let services = Arc::new(services::build_services(&config.workflow)?);
    let app = app::router(services.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    services.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
