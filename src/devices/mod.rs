//! Device directory
//!
//! Cameras and sensor nodes register here under a unique name, which is
//! also the `device_id` they report telemetry under. The directory backs
//! the agent management endpoints and the health check.

pub mod directory;
pub mod health;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use directory::MemoryDirectory;
pub use health::{device_health, HealthStatus};

/// Default reporting interval for devices that do not declare one
pub const DEFAULT_REPORT_INTERVAL_SECS: u32 = 60;

fn default_report_interval() -> u32 {
    DEFAULT_REPORT_INTERVAL_SECS
}

/// A registered device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Unique name, used as the telemetry `device_id`
    pub name: String,
    /// Where the device can be reached, if it exposes anything
    pub url: Option<String>,
    /// How often the device promises to report, in seconds
    pub report_interval_secs: u32,
    pub description: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// Registration payload for creating or updating a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDevice {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u32,
    #[serde(default)]
    pub description: Option<String>,
}

/// Error type for directory operations
///
/// Display strings double as the API messages for these conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("Agent with this name already exists")]
    NameTaken(String),
    #[error("Agent not found")]
    NotFound(String),
    #[error("directory backend unavailable: {0}")]
    Unavailable(String),
}

/// Storage contract for device registrations
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// Register a device under a new unique name
    async fn create(&self, new: NewDevice) -> Result<Device, DirectoryError>;

    async fn get(&self, name: &str) -> Result<Option<Device>, DirectoryError>;

    /// All devices, newest registration first
    async fn list(&self) -> Result<Vec<Device>, DirectoryError>;

    /// Replace a device's registration, keeping its registration time
    ///
    /// Renaming onto an existing name is rejected.
    async fn update(&self, name: &str, new: NewDevice) -> Result<Device, DirectoryError>;

    async fn remove(&self, name: &str) -> Result<(), DirectoryError>;
}
