//! MQTT ingest bridge
//!
//! Optional bridge (behind the `mqtt` feature) that mirrors the HTTP
//! telemetry ingest over MQTT. Devices publish readings to `iot/data`;
//! the server can push commands to `iot/command/{device_id}`.

pub mod bridge;

pub use bridge::{BridgeError, MqttBridge, COMMAND_TOPIC, DATA_TOPIC};
