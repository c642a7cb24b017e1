//! Sensor telemetry storage
//!
//! Devices report structured readings alongside the camera feed. This
//! module defines the storage contract the HTTP and MQTT ingest paths
//! write through, plus the in-memory implementation used by the server.
//!
//! Backends are swappable behind [`TelemetryStore`]; a database-backed
//! implementation satisfies the same contract.

pub mod store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use store::MemoryStore;

/// A single stored sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Storage-assigned id, unique per store
    pub id: u64,
    /// Reporting device
    pub device_id: String,
    /// When the store accepted the reading
    pub recorded_at: DateTime<Utc>,
    /// Reported payload, minus the `device_id` field
    pub data: Value,
}

/// Filters for reading queries
///
/// All filters are optional and combine with AND. Results are always
/// newest-first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingQuery {
    pub device_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl ReadingQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a single device
    pub fn for_device(device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            ..Self::default()
        }
    }

    /// Keep readings recorded at or after `start`
    pub fn since(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    /// Keep readings recorded at or before `end`
    pub fn until(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Cap the number of returned readings
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Error type for ingest payload validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("Invalid data")]
    NotAnObject,
    #[error("device_id is required")]
    MissingDeviceId,
    #[error("device_id must be a string")]
    InvalidDeviceId,
}

/// Storage contract for sensor readings
///
/// `save` stamps the reading with the current time and a fresh id.
/// `query` returns matches newest-first.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    async fn save(&self, device_id: &str, data: Value) -> Result<SensorReading, StoreError>;

    async fn query(&self, query: ReadingQuery) -> Result<Vec<SensorReading>, StoreError>;

    /// Distinct device ids in first-seen order
    async fn device_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Delete every reading for a device, returning how many were removed
    async fn delete_device(&self, device_id: &str) -> Result<usize, StoreError>;
}

/// Split an ingest payload into its device id and remaining fields
///
/// Both ingest paths (HTTP and MQTT) accept a JSON object carrying a
/// `device_id` string plus arbitrary sensor fields. The id is removed
/// from the stored payload.
pub fn split_device_payload(payload: Value) -> Result<(String, Value), PayloadError> {
    let Value::Object(mut fields) = payload else {
        return Err(PayloadError::NotAnObject);
    };

    let device_id = match fields.remove("device_id") {
        Some(Value::String(id)) => id,
        Some(_) => return Err(PayloadError::InvalidDeviceId),
        None => return Err(PayloadError::MissingDeviceId),
    };

    if device_id.is_empty() {
        return Err(PayloadError::MissingDeviceId);
    }

    Ok((device_id, Value::Object(fields)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_split_extracts_device_id() {
        let payload = json!({"device_id": "esp32-01", "temperature": 21.5});
        let (device_id, data) = split_device_payload(payload).unwrap();
        assert_eq!(device_id, "esp32-01");
        assert_eq!(data, json!({"temperature": 21.5}));
    }

    #[test]
    fn test_split_rejects_non_object() {
        assert_eq!(
            split_device_payload(json!([1, 2, 3])),
            Err(PayloadError::NotAnObject)
        );
    }

    #[test]
    fn test_split_rejects_missing_or_empty_id() {
        assert_eq!(
            split_device_payload(json!({"temperature": 1})),
            Err(PayloadError::MissingDeviceId)
        );
        assert_eq!(
            split_device_payload(json!({"device_id": ""})),
            Err(PayloadError::MissingDeviceId)
        );
    }

    #[test]
    fn test_split_rejects_non_string_id() {
        assert_eq!(
            split_device_payload(json!({"device_id": 42})),
            Err(PayloadError::InvalidDeviceId)
        );
    }

    #[test]
    fn test_query_builder_chains() {
        let start = Utc::now();
        let query = ReadingQuery::for_device("esp32-01").since(start).limit(10);
        assert_eq!(query.device_id.as_deref(), Some("esp32-01"));
        assert_eq!(query.start, Some(start));
        assert_eq!(query.end, None);
        assert_eq!(query.limit, Some(10));
    }
}
