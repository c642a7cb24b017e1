//! MQTT bridge implementation

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use paho_mqtt::async_client::AsyncClient;
use paho_mqtt::{ConnectOptionsBuilder, CreateOptionsBuilder, Message, MessageBuilder};
use serde_json::Value;

use crate::telemetry::{split_device_payload, TelemetryStore};

/// Topic devices publish readings to
pub const DATA_TOPIC: &str = "iot/data";

/// Topic prefix for per-device commands
pub const COMMAND_TOPIC: &str = "iot/command";

const QOS: i32 = 0;

/// Bridge between an MQTT broker and the telemetry store
///
/// Subscribes to the data topic and saves every well-formed reading
/// through the same payload contract as the HTTP ingest route. Malformed
/// payloads are logged and skipped; the bridge never stops over one
/// message.
pub struct MqttBridge {
    client: AsyncClient,
    store: Arc<dyn TelemetryStore>,
}

impl MqttBridge {
    pub fn new(
        server_uri: &str,
        client_id: &str,
        store: Arc<dyn TelemetryStore>,
    ) -> Result<MqttBridge, BridgeError> {
        let client = AsyncClient::new(
            CreateOptionsBuilder::new()
                .server_uri(server_uri)
                .client_id(client_id)
                .finalize(),
        )?;

        Ok(MqttBridge { client, store })
    }

    /// Create the bridge from the environment
    ///
    /// `CAMHUB_MQTT_URI` is required; `CAMHUB_MQTT_CLIENT_ID` defaults to
    /// `camhub-server`.
    pub fn new_from_env(store: Arc<dyn TelemetryStore>) -> Result<MqttBridge, BridgeError> {
        let server_uri =
            std::env::var("CAMHUB_MQTT_URI").map_err(|_| BridgeError::MissingServerUri)?;
        let client_id = std::env::var("CAMHUB_MQTT_CLIENT_ID")
            .unwrap_or_else(|_| "camhub-server".to_string());

        MqttBridge::new(&server_uri, &client_id, store)
    }

    /// Connect, subscribe and consume messages until the client is shut down
    ///
    /// The broker session is kept across reconnects, so subscriptions
    /// survive a connection loss. The bridge is only borrowed, so a
    /// shared handle can keep publishing commands while the loop runs.
    pub async fn run(&self) -> Result<(), BridgeError> {
        // Clones share the one underlying client.
        let mut client = self.client.clone();
        let mut messages = client.get_stream(64);

        let conn_opts = ConnectOptionsBuilder::new()
            .keep_alive_interval(Duration::from_secs(60))
            .clean_session(false)
            .automatic_reconnect(Duration::from_secs(1), Duration::from_secs(30))
            .finalize();

        client.connect(conn_opts).await?;
        tracing::info!("connected to the MQTT broker");

        let command_topic = format!("{COMMAND_TOPIC}/+");
        client.subscribe(DATA_TOPIC, QOS).await?;
        client.subscribe(&command_topic, QOS).await?;
        tracing::info!(data = DATA_TOPIC, commands = %command_topic, "Subscribed");

        while let Some(message) = messages.next().await {
            match message {
                Some(msg) => self.handle_message(msg).await,
                None => tracing::warn!("MQTT connection lost, waiting for reconnect"),
            }
        }

        Ok(())
    }

    async fn handle_message(&self, msg: Message) {
        let topic = msg.topic().to_string();

        if topic.starts_with(DATA_TOPIC) {
            let payload: Value = match serde_json::from_slice(msg.payload()) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(%topic, error = %err, "Discarding non-JSON payload");
                    return;
                }
            };

            let (device_id, data) = match split_device_payload(payload) {
                Ok(split) => split,
                Err(err) => {
                    tracing::warn!(%topic, error = %err, "Discarding payload");
                    return;
                }
            };

            match self.store.save(&device_id, data).await {
                Ok(reading) => {
                    tracing::debug!(device = %device_id, id = reading.id, "Reading saved")
                }
                Err(err) => {
                    tracing::error!(device = %device_id, error = %err, "Failed to save reading")
                }
            }
        } else if topic.starts_with(COMMAND_TOPIC) {
            tracing::debug!(%topic, "Command response received");
        }
    }

    /// Publish a command to one device
    pub async fn publish_command(
        &self,
        device_id: &str,
        command: &Value,
    ) -> Result<(), BridgeError> {
        let topic = command_topic(device_id);
        let payload = serde_json::to_vec(command)?;

        let message = MessageBuilder::new()
            .topic(&topic)
            .payload(payload)
            .qos(QOS)
            .finalize();

        self.client.publish(message).await?;
        tracing::info!(%topic, device = device_id, "Command published");

        Ok(())
    }
}

impl Debug for MqttBridge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttBridge")
            .field("client_id", &self.client.client_id())
            .finish()
    }
}

/// Command topic for a specific device
fn command_topic(device_id: &str) -> String {
    format!("{COMMAND_TOPIC}/{device_id}")
}

#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error("MQTT: {0}")]
    Mqtt(#[from] paho_mqtt::Error),

    #[error("encode command payload: {0}")]
    EncodeCommand(#[from] serde_json::Error),

    #[error("CAMHUB_MQTT_URI is not set")]
    MissingServerUri,
}
