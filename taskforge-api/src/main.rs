//! # TaskForge API Server
//!
//! Task-tracking API with optimistic concurrency, a composable query
//! layer (filtering, domain-aware sorting, relation inclusion, dual-mode
//! pagination), role-based access scoping, and an asynchronous audit
//! trail.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskforge-api
//! ```

use taskforge_api::{
    app::{build_router, AppState},
    audit::AuditDispatcher,
    config::Config,
};
use taskforge_shared::db::pool::{create_pool, DatabaseConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskforge_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskForge API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..DatabaseConfig::default()
    })
    .await?;

    let audit = AuditDispatcher::spawn(pool.clone(), config.audit.queue_capacity);

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool, config, audit));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        return;
    }
    tracing::info!("Shutdown signal received, draining...");
}
