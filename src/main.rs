//! Feed Edge - cache and HTTP plumbing for a social-feed content service
//!
//! Serves the static frontend behind CORS and gzip middleware, with the
//! shared cache available to handlers.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feed_edge::api::create_router;
use feed_edge::cache::Cache;
use feed_edge::{spawn_cleanup_task, AppState, Config};

/// Main entry point for the Feed Edge server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the cache (Redis if reachable, memory otherwise)
/// 4. Start background TTL cleanup task
/// 5. Assemble the router and middleware chain
/// 6. Start HTTP server on configured port
/// 7. On SIGINT/SIGTERM, stop the sweeper and close the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feed_edge=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Feed Edge server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: static_root={}, port={}, cleanup_interval={}s, origins={}",
        config.static_root.display(),
        config.server_port,
        config.cleanup_interval,
        config.allowed_origins.len()
    );

    let state = AppState::from_config(&config).await;
    info!("Cache initialized (backend: {})", state.cache.mode().as_str());

    let cleanup_handle = config
        .cleanup_period()
        .map(|period| spawn_cleanup_task(state.cache.clone(), period));

    let cache = state.cache.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    close_cache(&cache).await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweeper.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }
}

async fn close_cache(cache: &Arc<Cache>) {
    if let Err(e) = cache.close().await {
        warn!("Failed to close cache backend: {}", e);
    }
}
