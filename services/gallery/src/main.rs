use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gallery::{
    AppState,
    blob::FsBlobStore,
    config::{GalleryConfig, SessionBackend},
    credentials::CredentialStore,
    lifecycle::BlobLifecycleManager,
    repositories::{FamilyRepository, PhotoRepository},
    routes,
    session::{MemorySessionStore, RedisSessionStore, SessionManager, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting family gallery service");

    let config = GalleryConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let session_store: Arc<dyn SessionStore> = match config.session_backend {
        SessionBackend::Redis => {
            let redis_config = RedisConfig::from_env()?;
            let redis_pool = RedisPool::new(&redis_config).await?;
            if !redis_pool.health_check().await? {
                anyhow::bail!("Redis did not answer PING");
            }
            Arc::new(RedisSessionStore::new(redis_pool))
        }
        SessionBackend::Memory => {
            let store = MemorySessionStore::new();
            store.spawn_sweeper(Duration::from_secs(300));
            info!("Keeping sessions in process memory, sweeping every 5 minutes");
            Arc::new(store)
        }
    };

    let blobs = Arc::new(FsBlobStore::open(&config.upload_dir).await?);
    let families = Arc::new(FamilyRepository::new(pool.clone()));
    let photos = Arc::new(PhotoRepository::new(pool.clone()));

    let app_state = AppState {
        credentials: CredentialStore::new(families)?,
        sessions: SessionManager::new(session_store, config.session_ttl()),
        lifecycle: BlobLifecycleManager::new(blobs, photos),
        max_upload_bytes: config.max_upload_bytes,
    };

    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("Gallery service listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Draining complete, closing database pool");
    pool.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received");
}
