//! camhub — MJPEG camera relay with an IoT telemetry backend
//!
//! A single HTTP service that accepts JPEG frames pushed by ESP32-class
//! cameras and re-broadcasts them live to any number of browser viewers,
//! alongside JSON telemetry storage and device registration for the same
//! fleet.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use camhub::server::{self, AppState, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::default();
//!     let state = Arc::new(AppState::new(&config));
//!     server::serve(&config, state).await
//! }
//! ```
//!
//! Cameras POST JPEG bytes to `/upload_frame`; browsers watch `/stream`,
//! which serves `multipart/x-mixed-replace` and updates the image on
//! every pushed frame. Telemetry and device registration live under
//! `/data` and `/agent`.

pub mod devices;
pub mod relay;
pub mod server;
pub mod stats;
pub mod telemetry;

#[cfg(feature = "mqtt")]
pub mod mqtt;

pub use relay::{FrameHub, PublishError, Viewer};
pub use server::{AppState, ServerConfig};
