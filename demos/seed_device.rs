//! Walk through the device registry and telemetry API
//!
//! Run with: cargo run --example seed_device [SERVER_URL]
//!
//! Registers a device, posts a few sensor readings, queries them back
//! newest-first, then checks the device's health window. Useful as a
//! smoke test against a freshly started server:
//!
//!   cargo run &
//!   cargo run --example seed_device

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:12346";
const DEVICE_NAME: &str = "demo-sensor";

fn print_usage() {
    eprintln!("Usage: seed_device [SERVER_URL]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  SERVER_URL    camhub server (default: {})", DEFAULT_SERVER_URL);
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let server_url = args
        .get(1)
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

    let client = reqwest::Client::new();

    println!("=== Register {} ===", DEVICE_NAME);
    let resp = client
        .post(format!("{}/agent/create_agent", server_url))
        .json(&serde_json::json!({
            "name": DEVICE_NAME,
            "url": "http://demo-sensor.local",
            "report_interval_secs": 60,
            "description": "seeded by the seed_device example",
        }))
        .send()
        .await?;

    if resp.status().is_success() {
        let device: serde_json::Value = resp.json().await?;
        println!("{}", pretty(&device));
    } else {
        // A previous run probably left the registration behind
        let body: serde_json::Value = resp.json().await?;
        println!("Registration skipped: {}", body["message"]);
    }

    println!();
    println!("=== Post three sensor readings ===");
    for (temperature, humidity) in [(21.5, 40.0), (21.9, 41.5), (22.4, 39.0)] {
        let body: serde_json::Value = client
            .post(format!("{}/data/iot_data", server_url))
            .json(&serde_json::json!({
                "device_id": DEVICE_NAME,
                "temperature": temperature,
                "humidity": humidity,
            }))
            .send()
            .await?
            .json()
            .await?;
        println!("temperature={} humidity={} -> {}", temperature, humidity, body["status"]);
    }

    println!();
    println!("=== Known devices ===");
    let devices: serde_json::Value = client
        .get(format!("{}/data/get_iot_device_list", server_url))
        .send()
        .await?
        .json()
        .await?;
    println!("{}", pretty(&devices["devices"]));

    println!();
    println!("=== Latest readings (newest first) ===");
    let readings: serde_json::Value = client
        .post(format!("{}/data/query_iot_data", server_url))
        .json(&serde_json::json!({"device_id": DEVICE_NAME, "limit": 5}))
        .send()
        .await?
        .json()
        .await?;
    println!("{}", pretty(&readings["data"]));

    println!();
    println!("=== Health check ===");
    let health: serde_json::Value = client
        .get(format!("{}/agent/health_check/{}", server_url, DEVICE_NAME))
        .send()
        .await?
        .json()
        .await?;
    println!("{}", pretty(&health));

    Ok(())
}
