//! PLP host (sender) - Packet Loss Probe
//!
//! Streams probe packets to whichever client last announced itself, feeds
//! the returning acks into a loss window, and reports drops once a second.
//!
//! Usage:
//!   cargo run --release --bin plp-host -- [OPTIONS]
//!
//! Example:
//!   # default port, 100ms pacing
//!   cargo run --release --bin plp-host
//!
//!   # slower pacing for a long-haul link
//!   cargo run --release --bin plp-host -- --pace 250

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use plp::{Config, Host, DEFAULT_PORT};

/// How often the binary logs a session summary.
const SUMMARY_INTERVAL_SECS: u64 = 10;

struct HostArgs {
    bind_addr: SocketAddr,
    config: Config,
}

impl Default for HostArgs {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            config: Config::default(),
        }
    }
}

fn parse_args() -> HostArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = HostArgs::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--pace" | "-p" => {
                if i + 1 < args.len() {
                    parsed.config.pace_interval_ms =
                        args[i + 1].parse().expect("pace must be milliseconds");
                    i += 1;
                }
            }
            "--report" | "-r" => {
                if i + 1 < args.len() {
                    parsed.config.report_interval_ms =
                        args[i + 1].parse().expect("report must be milliseconds");
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!(
                    r#"PLP Host - Packet Loss Probe sender

Binds UDP port {DEFAULT_PORT}, waits for a client restart sentinel, then
streams probe packets to that client and measures which acks come back.

Usage:
  cargo run --release --bin plp-host -- [OPTIONS]

Options:
  -p, --pace <MS>      interval between probe packets (default: 100)
  -r, --report <MS>    loss report cadence (default: 1000)
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
    info!("PLP host starting on {}", args.bind_addr);

    let host = Arc::new(Host::new(args.config));

    let summary_host = host.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(SUMMARY_INTERVAL_SECS)).await;
            let stats = summary_host.stats();
            info!(
                "session: {} probes sent, {} acks ({:.1}/s), {} drops confirmed, {} restarts",
                stats.packets,
                stats.acks,
                stats.ack_rate(),
                stats.confirmed_drops,
                stats.restarts
            );
        }
    });

    host.run(args.bind_addr).await?;
    Ok(())
}
