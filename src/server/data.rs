//! Telemetry routes
//!
//! JSON ingest and query endpoints for sensor readings, nested under
//! `/data`.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{json, Value};

use crate::telemetry::{split_device_payload, ReadingQuery};

use super::error::ApiError;
use super::AppState;

/// Readings returned per query when the caller does not set a limit
const DEFAULT_QUERY_LIMIT: usize = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/iot_data", post(receive_data))
        .route("/get_iot_device_list", get(get_device_list))
        .route("/query_iot_data", post(query_iot_data))
        .route("/delete_device_id", post(delete_device_id))
}

/// `POST /data/iot_data` — store one reading
///
/// The body is a JSON object with a `device_id` string plus arbitrary
/// sensor fields. The id is stripped before storage.
async fn receive_data(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let (device_id, data) =
        split_device_payload(payload).map_err(|err| ApiError::bad_request(err.to_string()))?;

    state.telemetry.save(&device_id, data).await.map_err(|err| {
        tracing::error!(device = %device_id, error = %err, "Failed to save reading");
        ApiError::internal("Failed to save data")
    })?;

    Ok(Json(json!({"status": "success"})))
}

/// `GET /data/get_iot_device_list` — distinct reporting device ids
async fn get_device_list(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let devices = state.telemetry.device_ids().await.map_err(|err| {
        tracing::error!(error = %err, "Device list query failed");
        ApiError::internal("Failed to get device list")
    })?;

    Ok(Json(json!({"status": "success", "devices": devices})))
}

/// `POST /data/query_iot_data` — readings for one device, newest first
///
/// Body fields: `device_id` (required), `limit` (positive integer,
/// default 100), `start_time` and `end_time` (ISO 8601, inclusive).
/// A device with no matching readings yields 404.
async fn query_iot_data(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let device_id = payload
        .get("device_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("device_id is required"))?;

    let mut query = ReadingQuery::for_device(device_id).limit(limit_filter(&payload)?);

    if let Some(start) = time_filter(&payload, "start_time")? {
        query = query.since(start);
    }
    if let Some(end) = time_filter(&payload, "end_time")? {
        query = query.until(end);
    }

    let readings = state.telemetry.query(query).await.map_err(|err| {
        tracing::error!(device = device_id, error = %err, "Reading query failed");
        ApiError::internal("Failed to get device info")
    })?;

    if readings.is_empty() {
        return Err(ApiError::not_found("Device not found"));
    }

    Ok(Json(json!({"status": "success", "data": readings})))
}

/// `POST /data/delete_device_id` — drop all readings for a device
async fn delete_device_id(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let device_id = payload
        .get("device_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("device_id is required"))?;

    state
        .telemetry
        .delete_device(device_id)
        .await
        .map_err(|err| {
            tracing::error!(device = device_id, error = %err, "Failed to delete readings");
            ApiError::internal("Failed to delete device data")
        })?;

    Ok(Json(json!({"status": "success"})))
}

/// Extract the row cap from the query payload
///
/// Absent or null means the default. Values past `usize::MAX` saturate.
fn limit_filter(payload: &Value) -> Result<usize, ApiError> {
    match payload.get("limit") {
        None | Some(Value::Null) => Ok(DEFAULT_QUERY_LIMIT),
        Some(value) => match value.as_u64() {
            Some(limit) if limit > 0 => Ok(usize::try_from(limit).unwrap_or(usize::MAX)),
            _ => Err(ApiError::bad_request("limit must be a positive integer")),
        },
    }
}

/// Extract an optional inclusive time bound from the query payload
fn time_filter(payload: &Value, key: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_str()
            .and_then(parse_time)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request("Invalid data")),
    }
}

/// Parse an ISO 8601 timestamp, with or without an offset
///
/// Offset-free timestamps are taken as UTC.
fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }

    value
        .parse::<NaiveDateTime>()
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
