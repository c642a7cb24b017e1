//! camhub server binary
//!
//! Run with: camhub [BIND_ADDR]
//!
//! Examples:
//!   camhub                      # binds to 0.0.0.0:12346
//!   camhub localhost            # binds to 127.0.0.1:12346
//!   camhub 127.0.0.1:8080       # binds to 127.0.0.1:8080
//!
//! Environment:
//!   CAMHUB_BIND                 bind address (overridden by BIND_ADDR)
//!   CAMHUB_MAILBOX_CAPACITY     frames buffered per viewer
//!   CAMHUB_MAX_FRAME_BYTES      upload size cap
//!   CAMHUB_MQTT_URI             enable the MQTT bridge (mqtt feature)
//!   CAMHUB_MQTT_CLIENT_ID       MQTT client id (default camhub-server)

use std::net::SocketAddr;
use std::sync::Arc;

use camhub::server::{self, AppState, ServerConfig};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:12346
/// - "localhost:8080" -> 127.0.0.1:8080
/// - "127.0.0.1" -> 127.0.0.1:12346
/// - "0.0.0.0:12346" -> 0.0.0.0:12346
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 12346;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: camhub [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:12346)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  camhub                      # binds to 0.0.0.0:12346");
    eprintln!("  camhub localhost            # binds to 127.0.0.1:12346");
    eprintln!("  camhub 127.0.0.1:8080       # binds to 127.0.0.1:8080");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("camhub=info".parse()?),
        )
        .init();

    let mut config = ServerConfig::from_env();

    if let Some(addr_str) = args.get(1) {
        match parse_bind_addr(addr_str) {
            Ok(addr) => config.bind_addr = addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    let state = Arc::new(AppState::new(&config));

    println!("Starting camhub on {}", config.bind_addr);
    println!();
    println!("=== Push frames ===");
    println!("curl -X POST --data-binary @frame.jpg http://localhost:{}/upload_frame", config.bind_addr.port());
    println!();
    println!("=== Watch the stream ===");
    println!("open http://localhost:{}/stream in a browser", config.bind_addr.port());
    println!();

    #[cfg(feature = "mqtt")]
    if std::env::var("CAMHUB_MQTT_URI").is_ok() {
        let bridge = camhub::mqtt::MqttBridge::new_from_env(Arc::clone(&state.telemetry))?;
        tokio::spawn(async move {
            if let Err(e) = bridge.run().await {
                tracing::error!(error = %e, "MQTT bridge failed");
            }
        });
    }

    // Run with Ctrl+C handling
    tokio::select! {
        result = server::serve(&config, state) => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_addr_full() {
        let addr = parse_bind_addr("127.0.0.1:8080").unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_parse_bind_addr_localhost_and_bare_ip() {
        assert_eq!(
            parse_bind_addr("localhost").unwrap(),
            "127.0.0.1:12346".parse().unwrap()
        );
        assert_eq!(
            parse_bind_addr("0.0.0.0").unwrap(),
            "0.0.0.0:12346".parse().unwrap()
        );
    }

    #[test]
    fn test_parse_bind_addr_rejects_garbage() {
        assert!(parse_bind_addr("not-an-address").is_err());
    }
}
