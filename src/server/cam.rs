//! Camera routes
//!
//! Frame ingest from the camera and the MJPEG live stream for viewers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Json};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use serde_json::{json, Value};

use crate::relay::PublishError;

use super::error::ApiError;
use super::AppState;

/// Boundary token between frames in the live stream
pub const STREAM_BOUNDARY: &str = "frame";

/// Content type of the live stream response
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// `POST /upload_frame` — accept one JPEG frame and fan it out
pub async fn upload_frame(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let size = body.len();

    match state.hub.publish(body) {
        Ok(viewers) => {
            tracing::info!(bytes = size, viewers, "Received frame");
            Ok(Json(json!({"status": "ok", "message": "Frame processed"})))
        }
        Err(err @ PublishError::EmptyFrame) => Err(ApiError::bad_request(err.to_string())),
    }
}

/// `GET /stream` — live MJPEG stream
///
/// Registers a viewer and streams each delivered frame as one part of a
/// `multipart/x-mixed-replace` response. The viewer handle lives inside
/// the response body, so when the client disconnects and the body is
/// dropped, the viewer unregisters itself.
pub async fn stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let viewer = state.hub.register();

    let parts = viewer.map(|frame| Ok::<_, Infallible>(multipart_part(&frame)));

    (
        [(header::CONTENT_TYPE, STREAM_CONTENT_TYPE)],
        Body::from_stream(parts),
    )
}

/// `GET /health` — static liveness response
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "message": "Server is running"}))
}

/// `GET /status` — relay counters and uptime
pub async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.hub.stats().snapshot();

    Json(json!({
        "status": "ok",
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "viewers": stats.viewers,
        "viewers_total": stats.viewers_total,
        "frames_received": stats.frames_received,
        "bytes_received": stats.bytes_received,
        "frames_delivered": stats.frames_delivered,
        "frames_dropped": stats.frames_dropped,
    }))
}

/// Wrap one frame as a multipart part
///
/// Layout: `--<boundary>` CRLF, a JPEG content-type header, a blank line,
/// the payload, CRLF. Browsers replace the displayed image on each part.
fn multipart_part(frame: &Bytes) -> Bytes {
    let mut part = BytesMut::with_capacity(frame.len() + STREAM_BOUNDARY.len() + 48);
    part.extend_from_slice(b"--");
    part.extend_from_slice(STREAM_BOUNDARY.as_bytes());
    part.extend_from_slice(b"\r\nContent-Type: image/jpeg\r\n\r\n");
    part.extend_from_slice(frame);
    part.extend_from_slice(b"\r\n");
    part.freeze()
}
