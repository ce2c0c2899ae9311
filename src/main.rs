use std::sync::Arc;

use config::AppConfig;
use errors::StartupError;
use service::FolderService;
use storage::{FileStore, LocalFileStorage};

mod config;
mod errors;
mod listing;
mod models;
mod routes;
mod service;
mod storage;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    // No request is served unless the storage root is usable.
    let storage = LocalFileStorage::init(&config.storage_path, config.wipe_on_init).map_err(
        |source| {
            tracing::error!(path = %config.storage_path.display(), error = %source, "could not initialize the file storage");
            StartupError::Storage {
                path: config.storage_path.display().to_string(),
                source,
            }
        },
    )?;

    let root = storage.root().display().to_string();
    let service = FolderService::new(FileStore::new(Arc::new(storage)));
    let app = routes::router(service, config.max_upload_bytes);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    tracing::info!(root = %root, "Server running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
