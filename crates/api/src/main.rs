mod config;
mod error;
mod middleware;
mod routes;
mod state;

use pagewright_core::blocks::BlockRegistry;
use pagewright_core::engine::{ContentEngine, EngineConfig};
use pagewright_core::events::bus::EventBus;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    // Load configuration
    let config = config::AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting Pagewright API server");

    // Block palette and event bus are constructed here and injected; the
    // engine holds no global registries.
    let registry = BlockRegistry::with_builtin_types();
    let event_bus = EventBus::new(config.event_bus_capacity);

    let engine = ContentEngine::open(
        EngineConfig {
            data_dir: config.data_dir.clone(),
            max_revisions: config.max_revisions,
        },
        registry,
        event_bus,
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to open content engine: {e}"))?;

    tracing::info!(data_dir = %config.data_dir.display(), "Document store opened");

    // Build application state
    let state = state::AppState::new(engine, config.clone());

    // Build router with middleware
    let app = routes::build_router(state)
        .layer(middleware::trace_layer())
        .layer(middleware::cors_layer());

    // Start server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}
