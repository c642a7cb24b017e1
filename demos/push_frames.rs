//! Synthetic camera that pushes JPEG frames to a camhub server
//!
//! Run with: cargo run --example push_frames [SERVER_URL] [FPS]
//!
//! Examples:
//!   cargo run --example push_frames                              # 10 fps to http://127.0.0.1:12346
//!   cargo run --example push_frames http://192.168.1.50:12346    # 10 fps to a remote server
//!   cargo run --example push_frames http://127.0.0.1:12346 30    # 30 fps
//!
//! The frames are JPEG-marked test buffers, not decodable images, so
//! watch them arrive through the counters rather than a browser:
//!   curl http://127.0.0.1:12346/status
//!   curl -sN http://127.0.0.1:12346/stream | head -c 256 | xxd

use std::time::Duration;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:12346";
const DEFAULT_FPS: f64 = 10.0;

/// Build a JPEG-marked buffer carrying a sequence number.
///
/// Size varies with the sequence number so the relay's byte counters
/// move the way they would with a real camera.
fn make_frame(seq: u64) -> Vec<u8> {
    let body_len = 512 + (seq % 7) as usize * 128;

    let mut frame = Vec::with_capacity(body_len + 24);
    frame.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]); // SOI + APP0
    frame.extend_from_slice(b"camhub");
    frame.extend_from_slice(&seq.to_be_bytes());
    frame.resize(frame.len() + body_len, 0x55);
    frame.extend_from_slice(&[0xFF, 0xD9]); // EOI
    frame
}

fn print_usage() {
    eprintln!("Usage: push_frames [SERVER_URL] [FPS]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  SERVER_URL    camhub server (default: {})", DEFAULT_SERVER_URL);
    eprintln!("  FPS           frames per second (default: {})", DEFAULT_FPS);
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  push_frames");
    eprintln!("  push_frames http://192.168.1.50:12346");
    eprintln!("  push_frames http://127.0.0.1:12346 30");
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

    let fps = match args.get(2) {
        Some(raw) => match raw.parse::<f64>() {
            Ok(fps) if fps > 0.0 => fps,
            _ => {
                eprintln!("Error: invalid FPS '{}'", raw);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => DEFAULT_FPS,
    };

    let upload_url = format!("{}/upload_frame", server_url);
    println!("Pushing frames to {} at {} fps", upload_url, fps);
    println!("Stream them back:  curl -sN {}/stream | head -c 256 | xxd", server_url);
    println!("Watch the counts:  curl {}/status", server_url);
    println!();

    let client = reqwest::Client::new();
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / fps));

    let mut seq: u64 = 0;
    let mut sent: u64 = 0;
    let mut failed: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let frame = make_frame(seq);
                seq += 1;

                let result = client
                    .post(&upload_url)
                    .header("Content-Type", "image/jpeg")
                    .body(frame)
                    .send()
                    .await;

                match result {
                    Ok(resp) if resp.status().is_success() => sent += 1,
                    Ok(resp) => {
                        failed += 1;
                        eprintln!("Server refused frame {}: HTTP {}", seq, resp.status());
                    }
                    Err(e) => {
                        failed += 1;
                        eprintln!("Failed to send frame {}: {}", seq, e);
                    }
                }

                if sent > 0 && sent % 100 == 0 {
                    println!("Sent {} frames ({} failed)", sent, failed);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopping: {} frames sent, {} failed", sent, failed);
                break;
            }
        }
    }

    Ok(())
}
