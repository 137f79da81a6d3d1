use std::sync::Arc;

use apiary_api::config::{AppConfig, StorageConfig};
use apiary_api::state::AppState;
use apiary_core::store::{ApiaryStore, MemoryStore, PgStore};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting apiary API server");

    let store = connect_store(&config.storage).await?;
    let app = apiary_api::build_app(AppState::new(store.clone()));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn connect_store(storage: &StorageConfig) -> anyhow::Result<Arc<dyn ApiaryStore>> {
    match storage {
        StorageConfig::Postgres {
            database_url,
            max_connections,
            min_connections,
        } => {
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .min_connections(*min_connections)
                .connect(database_url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;
            tracing::info!("Connected to PostgreSQL");

            let store = PgStore::new(pool);
            store
                .migrate()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
            tracing::info!("Database migrations applied");

            Ok(Arc::new(store))
        }
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory store; records are lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}
