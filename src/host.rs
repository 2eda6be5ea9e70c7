//! Host side: paced probe transmission plus ack/restart reception.
//!
//! A spawned receive task decodes control datagrams and forwards them over
//! a channel; the main loop solely owns the [`DropMonitor`] and the active
//! client address, so nothing mutable is ever shared between tasks.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::monitor::DropMonitor;
use crate::packet::{Control, Packet};
use crate::stats::ProbeStats;
use crate::{Config, Error, Result, CONTROL_SIZE};

/// What the receive task hands to the owning loop.
enum HostEvent {
    Control(Control, SocketAddr),
}

/// One probe session on the host side.
///
/// The host idles until a client announces itself with the restart
/// sentinel, then streams probe packets to that address on a fixed pace
/// while measuring which acks come back. A later sentinel re-targets the
/// stream and resets the loss window, no disconnect required.
pub struct Host {
    config: Config,
    stats: Arc<RwLock<ProbeStats>>,
    running: Arc<AtomicBool>,
}

impl Host {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stats: Arc::new(RwLock::new(ProbeStats::new())),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Binds the socket and runs until [`stop`](Self::stop).
    ///
    /// Bind failure is the only fatal error; everything after setup is
    /// logged and survived.
    pub async fn run(&self, bind_addr: SocketAddr) -> Result<()> {
        let socket = UdpSocket::bind(bind_addr).await?;
        self.run_socket(socket).await
    }

    /// Runs on an already-bound socket.
    pub async fn run_socket(&self, socket: UdpSocket) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);

        let socket = Arc::new(socket);
        info!("PLP host listening on {}", socket.local_addr()?);

        let (event_tx, mut event_rx) = mpsc::channel::<HostEvent>(1024);

        // Receive task: control datagrams in, events out. The timeout keeps
        // the running flag responsive.
        let recv_socket = socket.clone();
        let recv_timeout = self.config.recv_timeout();
        let running_recv = self.running.clone();
        tokio::spawn(async move {
            // headroom past CONTROL_SIZE so an oversized datagram shows
            // its real length and fails decode instead of truncating
            let mut buf = [0u8; CONTROL_SIZE * 16];
            while running_recv.load(Ordering::SeqCst) {
                match tokio::time::timeout(recv_timeout, recv_socket.recv_from(&mut buf)).await {
                    Ok(Ok((len, addr))) => match Control::decode(&buf[..len]) {
                        Ok(control) => {
                            if event_tx.send(HostEvent::Control(control, addr)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("discarding datagram from {}: {}", addr, e),
                    },
                    Ok(Err(e)) => warn!("receive error: {}", e),
                    Err(_) => {}
                }
            }
        });

        let mut monitor = DropMonitor::new(self.config.window, self.config.report_interval());
        let mut client: Option<SocketAddr> = None;
        // 0 is the sentinel, real probes start at 1
        let mut sequence_id: u32 = 1;

        let mut pace = tokio::time::interval(self.config.pace_interval());
        pace.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut report = tokio::time::interval(self.config.report_interval());

        info!("waiting for client...");
        while self.running.load(Ordering::SeqCst) {
            tokio::select! {
                event = event_rx.recv() => {
                    let Some(HostEvent::Control(control, addr)) = event else {
                        // only the receive task closes this, and only on
                        // shutdown; anything else is a wiring failure
                        if self.running.load(Ordering::SeqCst) {
                            return Err(Error::ChannelClosed);
                        }
                        break;
                    };
                    match control {
                        Control::Restart => {
                            info!("client announced from {}", addr);
                            client = Some(addr);
                            monitor.reset();
                            self.stats.write().record_restart();
                        }
                        Control::Ack(seq) => {
                            debug!("ack {}", seq);
                            monitor.observe(seq);
                            self.stats.write().record_ack();
                        }
                    }
                }
                _ = pace.tick(), if client.is_some() => {
                    if let Some(target) = client {
                        let probe = Packet::probe(sequence_id);
                        if let Err(e) = socket.send_to(&probe.encode(), target).await {
                            // a failed send is just another lost packet
                            warn!("could not send probe {}: {}", sequence_id, e);
                        }
                        sequence_id = sequence_id.wrapping_add(1);
                        self.stats.write().record_packet();
                    }
                }
                _ = report.tick() => {
                    if let Some(loss) = monitor.report() {
                        info!("{}", loss);
                        self.stats.write().record_report(loss.dropped);
                    }
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Snapshot of the session counters.
    pub fn stats(&self) -> ProbeStats {
        self.stats.read().clone()
    }
}
