use std::sync::Arc;

use anyhow::Context;
use routersync_api::{create_router, AppState};
use routersync_config::{load_config, AppConfig};
use routersync_logging::LogFormat;
use routersync_store::{MemoryRepository, PostgresRepository, Store};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path =
        std::env::var("ROUTERSYNC_CONFIG").unwrap_or_else(|_| "config/routersync".to_string());
    let config: AppConfig = load_config(&config_path).context("failed to load configuration")?;

    // Initialize logging
    let format = config.log_format.parse().unwrap_or(LogFormat::Json);
    routersync_logging::init_with_level(&config.log_level, format);

    // Register metrics
    routersync_metrics::register_metrics();

    info!(
        service = %config.service_name,
        version = env!("CARGO_PKG_VERSION"),
        "Starting router sync service"
    );

    // Initialize repository
    let store: Arc<dyn Store> = match config.database_url() {
        Some(url) => Arc::new(
            PostgresRepository::new(&url, config.database.max_connections)
                .await
                .context("failed to connect to database")?,
        ),
        None => {
            warn!("no database configured; using the in-memory store");
            Arc::new(MemoryRepository::new())
        }
    };

    let state = Arc::new(AppState::from_config(store, &config));
    let app = create_router(state);

    // Start HTTP server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!("Listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
