//! Searchable PDF Server
//!
//! An OCR conversion service: scanned images and PDFs go in, PDFs with an
//! invisible, geometry-aligned text layer come out.

use std::net::SocketAddr;

use anyhow::Context;
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod convert;
mod error;
mod ocr;
mod overlay;
mod raster;
mod routes;
mod state;
mod verify;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "searchable_pdf_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing::info!(
        "Starting Searchable PDF Server v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("OCR engine: {:?}", config.ocr.engine);
    tracing::info!("Work dir: {}", config.convert.work_dir.display());

    std::fs::create_dir_all(&config.convert.work_dir).with_context(|| {
        format!(
            "Failed to create work dir {}",
            config.convert.work_dir.display()
        )
    })?;

    let max_upload = config.server.max_upload_bytes;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let app_state = AppState::new(config);

    if !app_state.converter().engine_available().await {
        tracing::warn!(
            engine = app_state.converter().engine_name(),
            "OCR engine unavailable at startup, conversions will produce image-only pages"
        );
    }

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api/v1", routes::api_router())
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    tracing::info!("Searchable PDF Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
