//! services/web/src/bin/web.rs

use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use web_lib::{
    adapters::{BackendAdapter, MemoryTokenStore},
    config::Config,
    error::ApiError,
    web::{router, AppState},
};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting gateway...");

    // --- 2. Initialize Service Adapters ---
    let backend = Arc::new(BackendAdapter::new(config.backend_url.clone())?);
    let store = Arc::new(MemoryTokenStore::default());
    info!(backend = %config.backend_url, policy = ?config.protection_policy, "Adapters ready");

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(&config, backend, store));
    let shutdown = app_state.shutdown.clone();

    // --- 4. Create the Web Router ---
    let app = router(app_state).layer(TraceLayer::new_for_http());

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown requested; closing event streams");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
