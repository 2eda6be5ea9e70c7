//! PLP client (receiver) - Packet Loss Probe
//!
//! Announces itself to a host, acks every probe packet it receives, and
//! reports its own view of packet loss once a second. Re-announces whenever
//! the host goes silent.
//!
//! Usage:
//!   cargo run --release --bin plp-client -- [OPTIONS]
//!
//! Example:
//!   cargo run --release --bin plp-client -- --host 192.168.1.10:5940

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use plp::{Client, Config, DEFAULT_PORT};

/// How often the binary logs a session summary.
const SUMMARY_INTERVAL_SECS: u64 = 10;

struct ClientArgs {
    bind_addr: SocketAddr,
    host_addr: SocketAddr,
    config: Config,
}

impl Default for ClientArgs {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            host_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            config: Config::default(),
        }
    }
}

fn parse_args() -> ClientArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = ClientArgs::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--host" | "-H" => {
                if i + 1 < args.len() {
                    parsed.host_addr = args[i + 1].parse().expect("host must be addr:port");
                    i += 1;
                }
            }
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    parsed.bind_addr = args[i + 1].parse().expect("bind must be addr:port");
                    i += 1;
                }
            }
            "--silence" => {
                if i + 1 < args.len() {
                    parsed.config.silence_threshold_ms =
                        args[i + 1].parse().expect("silence must be milliseconds");
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!(
                    r#"PLP Client - Packet Loss Probe receiver

Announces itself to the host with a restart sentinel, acks every probe
packet it receives, and reports packet loss once a second. If the host
goes silent the announcement repeats until the stream resumes.

Usage:
  cargo run --release --bin plp-client -- [OPTIONS]

Options:
  -H, --host <ADDR>    host address (default: 127.0.0.1:{DEFAULT_PORT})
  -b, --bind <ADDR>    local bind address (default: 0.0.0.0:0 = any port)
  --silence <MS>       silence threshold before re-announcing (default: 3000)
  -h, --help           print this help
"#
                );
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    parsed
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = parse_args();
    info!("PLP client starting, host: {}", args.host_addr);

    let client = Arc::new(Client::new(args.config));

    let summary_client = client.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(SUMMARY_INTERVAL_SECS)).await;
            let stats = summary_client.stats();
            info!(
                "session: {} packets received, {} acks sent, {} drops confirmed, {} announcements",
                stats.packets, stats.acks, stats.confirmed_drops, stats.restarts
            );
        }
    });

    client.run(args.bind_addr, args.host_addr).await?;
    Ok(())
}
