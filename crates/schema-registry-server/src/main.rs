use std::net::SocketAddr;
use std::sync::Arc;

use schema_registry_core::EngineBackend;
use schema_registry_server::config::ServerConfig;
use schema_registry_server::metrics::RegistryMetrics;
use schema_registry_server::state::AppState;
use schema_registry_server::build_router;
use schema_registry_storage::MemoryEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::var("SCHEMA_REGISTRY_CONFIG_FILE") {
        Ok(path) => ServerConfig::from_file(&path)?,
        Err(_) => ServerConfig::from_env()?,
    };
    config
        .validate()
        .map_err(|errors| anyhow::anyhow!(errors.join("; ")))?;

    match config.observability.log_format.as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(config.observability.log_level.clone()))
            .json()
            .init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(config.observability.log_level.clone()))
            .init(),
    }

    tracing::info!("Starting schema registry server");
    config.print_summary();

    let engine: Arc<dyn EngineBackend> = Arc::new(MemoryEngine::new(
        config.default_compatibility(),
        config.default_mode(),
    ));
    let metrics = Arc::new(RegistryMetrics::new());
    let state = AppState { engine, metrics };

    let router = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.listen_address, config.server.http_port).parse()?;
    tracing::info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
