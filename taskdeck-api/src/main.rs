//! taskdeck API Server Entry Point
//!
//! Loads configuration from the environment, connects the store, and serves
//! the Axum router until Ctrl-C.

use axum::Router;
use taskdeck_api::telemetry::init_logging;
use taskdeck_api::{
    connect_store, create_router, ApiConfig, ApiError, ApiResult, AppState, LogConfig,
    ServerConfig, StoreConfig,
};
use taskdeck_storage::CacheConfig;

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_logging(&LogConfig::from_env())?;

    let store_config = StoreConfig::from_env()?;
    let cache_config = CacheConfig::from_env()?;
    let api_config = ApiConfig::from_env();
    let server_config = ServerConfig::from_env();

    let store = connect_store(&store_config).await?;
    let state = AppState::new(store, &store_config, cache_config, api_config);
    let app: Router = create_router(state);

    let addr = server_config.resolve_bind_addr()?;
    tracing::info!(
        %addr,
        tasks_table = %store_config.tasks_table,
        users_table = %store_config.users_table,
        "Starting taskdeck API server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
