//! Device management routes
//!
//! Registration CRUD and the health check, nested under `/agent`.
//! Devices are historically called agents on this surface.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde_json::{json, Value};

use crate::devices::{device_health, Device, NewDevice};

use super::error::ApiError;
use super::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create_agent", post(create_agent))
        .route("/delete_agent/{name}", delete(delete_agent))
        .route("/get_agent/{name}", get(get_agent))
        .route("/get_all_agent", get(get_all_agents))
        .route("/update_agent/{name}", put(update_agent))
        .route("/health_check/{name}", get(health_check))
}

/// `POST /agent/create_agent` — register a device
async fn create_agent(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewDevice>,
) -> Result<Json<Device>, ApiError> {
    let device = state.devices.create(new).await?;
    Ok(Json(device))
}

/// `DELETE /agent/delete_agent/{name}`
async fn delete_agent(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.devices.remove(&name).await?;
    Ok(Json(json!({"message": "Agent deleted successfully"})))
}

/// `GET /agent/get_agent/{name}`
async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Device>, ApiError> {
    let device = state
        .devices
        .get(&name)
        .await?
        .ok_or_else(|| ApiError::not_found("Agent not found"))?;

    Ok(Json(device))
}

/// `GET /agent/get_all_agent` — all registrations, newest first
async fn get_all_agents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Device>>, ApiError> {
    Ok(Json(state.devices.list().await?))
}

/// `PUT /agent/update_agent/{name}`
async fn update_agent(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(new): Json<NewDevice>,
) -> Result<Json<Device>, ApiError> {
    Ok(Json(state.devices.update(&name, new).await?))
}

/// `GET /agent/health_check/{name}` — reporting-based health verdict
///
/// `*` checks every registered device and returns a name-to-status map.
/// A known name returns a single-entry list; an unknown name returns a
/// `failed` envelope with HTTP 200.
async fn health_check(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if name == "*" {
        let devices = state.devices.list().await?;

        let mut info = serde_json::Map::new();
        for device in devices {
            let status = device_health(&device, state.telemetry.as_ref()).await?;
            info.insert(device.name.clone(), json!({"status": status}));
        }

        return Ok(Json(json!({"status": "success", "info": info})));
    }

    let Some(device) = state.devices.get(&name).await? else {
        return Ok(Json(json!({
            "status": "failed",
            "error_info": format!("no agent found with name: {name}"),
        })));
    };

    let status = device_health(&device, state.telemetry.as_ref()).await?;
    let entry = json!({ name: {"status": status} });

    Ok(Json(json!({"status": "success", "info": [entry]})))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::server::ServerConfig;

    use super::*;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(&ServerConfig::default()))
    }

    fn registration(name: &str) -> NewDevice {
        NewDevice {
            name: name.to_string(),
            url: None,
            report_interval_secs: 60,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_health_check_unknown_device() {
        let state = state();

        let Json(body) = health_check(State(state), Path("ghost".to_string()))
            .await
            .unwrap();

        assert_eq!(body["status"], "failed");
        assert_eq!(body["error_info"], "no agent found with name: ghost");
    }

    #[tokio::test]
    async fn test_health_check_single_device_shape() {
        let state = state();
        state.devices.create(registration("cam-1")).await.unwrap();
        state.telemetry.save("cam-1", json!({"t": 1})).await.unwrap();

        let Json(body) = health_check(State(state), Path("cam-1".to_string()))
            .await
            .unwrap();

        assert_eq!(body["status"], "success");
        assert_eq!(body["info"], json!([{"cam-1": {"status": "healthy"}}]));
    }

    #[tokio::test]
    async fn test_health_check_wildcard_aggregates() {
        let state = state();
        state.devices.create(registration("cam-1")).await.unwrap();
        state.devices.create(registration("cam-2")).await.unwrap();
        state.telemetry.save("cam-1", json!({"t": 1})).await.unwrap();

        let Json(body) = health_check(State(state), Path("*".to_string()))
            .await
            .unwrap();

        assert_eq!(body["status"], "success");
        assert_eq!(body["info"]["cam-1"]["status"], "healthy");
        assert_eq!(body["info"]["cam-2"]["status"], "unhealthy");
    }
}
