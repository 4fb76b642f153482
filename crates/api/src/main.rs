mod config;
mod error;
mod feed_client;
mod middleware;
mod routes;
mod state;

use std::sync::Arc;

use glossary_notify_core::events::bus::EventBus;
use glossary_notify_core::pipeline::PipelineOptions;
use glossary_notify_core::scheduler::poll_scheduler_task;
use glossary_notify_core::{NotificationEngine, NotificationService};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::feed_client::HttpEventFeed;

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

    tracing::info!("Starting glossary notification service");

    // Wire feed, engine and bus
    let feed = Arc::new(HttpEventFeed::new(
        &config.feed_base_url,
        config.feed_token.clone(),
    ));
    let options = PipelineOptions {
        window: chrono::Duration::minutes(config.group_window_minutes),
        id_strategy: config.id_strategy,
    };
    let engine = NotificationEngine::new(options, config.read_reconciliation);
    let event_bus = EventBus::new(config.event_bus_capacity);
    let service = Arc::new(NotificationService::new(feed, engine, event_bus));

    tracing::info!(
        feed = %config.feed_base_url,
        window_minutes = config.group_window_minutes,
        "Notification engine ready"
    );

    // Start polling
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = tokio::spawn(poll_scheduler_task(
        Arc::clone(&service),
        config.poll_interval,
        shutdown_rx,
    ));

    // Build application state
    let state = state::AppState::new(service, config.clone());

    // Build router with middleware
    let app = routes::build_router(state)
        .layer(middleware::request_tracing::trace_layer())
        .layer(middleware::cors::cors_layer());

    // Start server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop polling; an in-flight fetch is discarded
    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler.await {
        tracing::warn!("Poll scheduler ended abnormally: {e}");
    }

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
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
