use merai_backend::config::BackendConfig;
use merai_backend::module::pipeline::SkyContext;
use merai_backend::service;

use anyhow::{Context, Result};
use std::sync::Arc;

const CONFIG_PATH: &str = "config.toml";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load configuration
    let config = BackendConfig::load_or_default(CONFIG_PATH)?;

    // Initialize logging
    let _logging_guard =
        merai_backend::logging::init_logging(&config.log_dir, "merai-backend", &config.log_level)?;

    tracing::info!("Merai Backend starting...");
    tracing::info!("Ephemeris: {}", config.data.ephemeris_path.display());
    tracing::info!("Star catalog: {}", config.data.catalog_path.display());

    let context = Arc::new(SkyContext::from_config(&config)?);
    tracing::info!(
        "Constellation map ready ({} entries)",
        context.constellations().len()
    );

    let app = service::router(context);

    let address = config.server_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Merai Backend stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
