//! In-memory telemetry store
//!
//! Reference implementation of [`TelemetryStore`] backed by a `Vec` under
//! an async `RwLock`. Suitable for single-process deployments and tests;
//! readings do not survive a restart.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{ReadingQuery, SensorReading, StoreError, TelemetryStore};

/// Volatile reading store
#[derive(Debug)]
pub struct MemoryStore {
    readings: RwLock<Vec<SensorReading>>,
    next_id: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            readings: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Get the number of stored readings
    pub async fn len(&self) -> usize {
        self.readings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.readings.read().await.is_empty()
    }
}

fn matches(reading: &SensorReading, query: &ReadingQuery) -> bool {
    if let Some(ref device_id) = query.device_id {
        if reading.device_id != *device_id {
            return false;
        }
    }
    if let Some(start) = query.start {
        if reading.recorded_at < start {
            return false;
        }
    }
    if let Some(end) = query.end {
        if reading.recorded_at > end {
            return false;
        }
    }
    true
}

#[async_trait]
impl TelemetryStore for MemoryStore {
    async fn save(&self, device_id: &str, data: Value) -> Result<SensorReading, StoreError> {
        let reading = SensorReading {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            device_id: device_id.to_string(),
            recorded_at: Utc::now(),
            data,
        };

        self.readings.write().await.push(reading.clone());

        tracing::debug!(device = device_id, id = reading.id, "Reading saved");

        Ok(reading)
    }

    async fn query(&self, query: ReadingQuery) -> Result<Vec<SensorReading>, StoreError> {
        let readings = self.readings.read().await;

        let mut matched: Vec<SensorReading> = readings
            .iter()
            .filter(|reading| matches(reading, &query))
            .cloned()
            .collect();

        // Newest first; ids break timestamp ties since they grow with
        // insertion order
        matched.sort_by(|a, b| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }

    async fn device_ids(&self) -> Result<Vec<String>, StoreError> {
        let readings = self.readings.read().await;

        let mut seen = std::collections::HashSet::new();
        let mut ids = Vec::new();
        for reading in readings.iter() {
            if seen.insert(reading.device_id.as_str()) {
                ids.push(reading.device_id.clone());
            }
        }

        Ok(ids)
    }

    async fn delete_device(&self, device_id: &str) -> Result<usize, StoreError> {
        let mut readings = self.readings.write().await;

        let before = readings.len();
        readings.retain(|reading| reading.device_id != device_id);
        let deleted = before - readings.len();

        if deleted > 0 {
            tracing::info!(device = device_id, deleted, "Device readings deleted");
        }

        Ok(deleted)
    }
}
