use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgStore, RecordStore};
use crate::routes;
use crate::state::AppState;
use crate::storage::{ObjectStorage, S3Storage};
use crate::upload::{KeyGenerator, StorageUploader, UploadService, UploadValidator};

/// Wire the upload pipeline around any object store
pub fn upload_service(storage: Arc<dyn ObjectStorage>, config: &AppConfig) -> UploadService {
    UploadService::new(
        UploadValidator::new(config.upload.clone()),
        KeyGenerator::system(),
        StorageUploader::from_config(storage, &config.storage),
    )
}

/// Open the bucket and make sure it answers
pub async fn connect_storage(config: &AppConfig) -> anyhow::Result<UploadService> {
    let storage = S3Storage::new(&config.storage).context("Failed to configure object storage")?;
    let uploads = upload_service(Arc::new(storage), config);
    uploads
        .uploader()
        .preflight()
        .await
        .with_context(|| format!("Bucket {} is not reachable", config.storage.bucket))?;
    Ok(uploads)
}

/// Production state: PostgreSQL record store plus the S3 bucket.
/// Fails when either is unreachable.
pub async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("Failed to connect to the database")?;
    let store: Arc<dyn RecordStore> = Arc::new(PgStore::new(pool));
    store.ping().await.context("Database did not answer")?;

    let uploads = connect_storage(&config).await?;
    Ok(AppState::new(config, store, uploads))
}

pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let state = build_state(config).await?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "Activaciones API listening");

    axum::serve(listener, routes::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
