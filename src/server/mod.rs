//! HTTP server
//!
//! axum routes for camera ingest, live streaming, telemetry and device
//! management:
//!
//! - `POST /upload_frame` — camera pushes one JPEG frame
//! - `GET  /stream` — MJPEG live stream (`multipart/x-mixed-replace`)
//! - `GET  /health` — liveness probe
//! - `GET  /status` — relay counters and uptime
//! - `/data/*` — telemetry ingest and queries
//! - `/agent/*` — device registration and health checks

pub mod agent;
pub mod cam;
pub mod config;
pub mod data;
pub mod error;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::devices::{DeviceDirectory, MemoryDirectory};
use crate::relay::FrameHub;
use crate::telemetry::{MemoryStore, TelemetryStore};

pub use config::ServerConfig;
pub use error::ApiError;

/// Shared state behind every route
pub struct AppState {
    pub hub: Arc<FrameHub>,
    pub telemetry: Arc<dyn TelemetryStore>,
    pub devices: Arc<dyn DeviceDirectory>,
    pub started_at: Instant,
}

impl AppState {
    /// Build fresh state with in-memory backends
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            hub: Arc::new(FrameHub::with_capacity(config.mailbox_capacity)),
            telemetry: Arc::new(MemoryStore::new()),
            devices: Arc::new(MemoryDirectory::new()),
            started_at: Instant::now(),
        }
    }
}

/// Assemble the full route tree over shared state
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/upload_frame", post(cam::upload_frame))
        .route("/stream", get(cam::stream))
        .route("/health", get(cam::health))
        .route("/status", get(cam::status))
        .nest("/data", data::routes())
        .nest("/agent", agent::routes())
        .layer(DefaultBodyLimit::max(config.max_frame_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the configured address and serve requests until aborted
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> Result<()> {
    let app = build_router(state, config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .context(format!("Failed to bind to {}", config.bind_addr))?;

    tracing::info!("camhub listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("HTTP server error")?;

    Ok(())
}
