//! unisync server - Main entry point

use anyhow::Result;
use axum::Router;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::info;
use unisync_common::logging::{init_logging, LogConfig};

use unisync_server::{
    config::Config,
    db::{self, DbConfig},
    features,
    ingest::{EtlOrchestrator, EtlScheduler, PgEtlStore},
    middleware,
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("unisync-server".to_string())
        .filter_directives("unisync_server=debug,tower_http=debug,sqlx=info".to_string())
        .build()
        // Environment variables take precedence
        .merge_env()?;

    init_logging(&log_config)?;

    info!("Starting unisync server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let db_pool = db::create_pool(&DbConfig::from(&config.database)).await?;
    db::run_migrations(&db_pool).await?;

    let _scheduler_handle = match config.etl.schedule_interval_secs {
        Some(secs) => {
            let store = Arc::new(PgEtlStore::new(db_pool.clone()));
            let orchestrator = Arc::new(EtlOrchestrator::new(config.etl.clone(), store)?);
            let handle = EtlScheduler::new(orchestrator, Duration::from_secs(secs)).start();
            info!(interval_secs = secs, "Pipeline scheduler started");
            Some(handle)
        },
        None => {
            info!("ETL_SCHEDULE_INTERVAL_SECS not set, scheduler not started");
            None
        },
    };

    let app = create_router(db_pool, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_router(db: sqlx::PgPool, config: &Config) -> Router {
    features::router(features::FeatureState { db })
        // Apply layers from innermost to outermost
        .layer(middleware::compression_layer())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
