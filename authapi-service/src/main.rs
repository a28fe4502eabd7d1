use authapi_service::{
    build_router,
    config::{ApiConfig, StoreBackend},
    db,
    services::{AuthService, Database, MemoryStore, Store},
    AppState,
};
use service_core::observability::{init_metrics, init_tracing};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Fail fast on bad configuration
    let config = ApiConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    let metrics = if config.metrics_enabled {
        Some(init_metrics()?)
    } else {
        None
    };

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        store = ?config.store_backend,
        "Starting authorization service"
    );

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config.database).await?;
            db::run_migrations(&pool).await?;
            Arc::new(Database::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    if let Some(admin) = &config.bootstrap_admin {
        let created = AuthService::new(store.clone())
            .ensure_admin(&admin.email, &admin.password)
            .await?;
        if created {
            tracing::info!("Bootstrap admin created");
        }
    }

    let state = AppState::new(config.clone(), store, metrics);
    let app = build_router(state)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(Duration::from_secs(
        config.common.shutdown_grace_seconds,
    )))
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    // Let load balancers notice before the listener closes
    tokio::time::sleep(grace).await;
}
