//! Device health heuristic
//!
//! A device is healthy when it has stored at least one telemetry reading
//! within its own reporting interval. A device that registered but never
//! reported, or whose last reading is older than the interval, is
//! unhealthy.

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::telemetry::{ReadingQuery, StoreError, TelemetryStore};

use super::Device;

/// Health verdict for a single device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check whether a device reported within its interval
pub async fn device_health(
    device: &Device,
    store: &dyn TelemetryStore,
) -> Result<HealthStatus, StoreError> {
    let window_start = Utc::now() - Duration::seconds(i64::from(device.report_interval_secs));

    let recent = store
        .query(
            ReadingQuery::for_device(&device.name)
                .since(window_start)
                .limit(1),
        )
        .await?;

    Ok(if recent.is_empty() {
        HealthStatus::Unhealthy
    } else {
        HealthStatus::Healthy
    })
}
