//! Amora server entrypoint

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::limit::ConcurrencyLimitLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use amora::config::ServerConfig;
use amora::handlers::{build_router, AppContext};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment wins
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("💖 Starting amora server...");

    // Fails fast when GEMINI_API_KEY is missing
    let config = ServerConfig::from_env()?;
    config.log();

    let context = Arc::new(AppContext::new(&config)?);
    let context_for_shutdown = Arc::clone(&context);

    let cors = config.cors.to_layer();

    let app = build_router(context)
        .layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🔒 Shutdown signal received, flushing store...");
    if let Err(e) = context_for_shutdown.flush() {
        tracing::error!(error = %e, "Failed to flush todo store");
    }

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown
async fn shutdown_signal() {
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received, starting graceful shutdown");
}
