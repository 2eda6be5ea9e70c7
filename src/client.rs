//! Client side: packet reception, acknowledgment, and the restart timer.
//!
//! Everything happens in one loop: a receive bounded by a short timeout so
//! the silence deadline gets checked regularly, an ack echoed per data
//! packet, and a periodic loss report. The restart deadline is a plain
//! `Instant` comparison each iteration.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::net::UdpSocket;
use tracing::{info, warn};

use crate::monitor::DropMonitor;
use crate::packet::{Control, Packet};
use crate::stats::ProbeStats;
use crate::{Config, Result, SERIALIZED_PACKET_SIZE};

/// Handshake progress as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientState {
    AwaitingFirstContact,
    Streaming,
}

/// One probe session on the client side.
///
/// Announces itself to the host with the zero-sequence-id sentinel, then
/// acks every data packet it manages to decode. If the host goes silent
/// past the threshold the announcement repeats indefinitely; that is a
/// designed recovery path, not an error.
pub struct Client {
    config: Config,
    stats: Arc<RwLock<ProbeStats>>,
    running: Arc<AtomicBool>,
}

impl Client {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stats: Arc::new(RwLock::new(ProbeStats::new())),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Binds the socket, announces to `host_addr`, and runs until
    /// [`stop`](Self::stop). Only bind failure is fatal.
    pub async fn run(&self, bind_addr: SocketAddr, host_addr: SocketAddr) -> Result<()> {
        let socket = UdpSocket::bind(bind_addr).await?;
        self.run_socket(socket, host_addr).await
    }

    /// Runs on an already-bound socket.
    pub async fn run_socket(&self, socket: UdpSocket, host_addr: SocketAddr) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);

        info!("PLP client bound to {}", socket.local_addr()?);

        let mut monitor = DropMonitor::new(self.config.window, self.config.report_interval());
        let mut state = ClientState::AwaitingFirstContact;
        let mut last_heard = Instant::now();

        self.announce(&socket, host_addr).await;

        let mut buf = vec![0u8; SERIALIZED_PACKET_SIZE];
        while self.running.load(Ordering::SeqCst) {
            // Silence past the threshold: re-announce and forget the old
            // window so resynchronization is not misread as mass loss.
            if last_heard.elapsed() >= self.config.silence_threshold() {
                last_heard = Instant::now();
                self.announce(&socket, host_addr).await;
                monitor.reset();
            }

            match tokio::time::timeout(self.config.recv_timeout(), socket.recv_from(&mut buf))
                .await
            {
                Ok(Ok((len, addr))) => {
                    match Packet::decode(&buf[..len]) {
                        Ok(packet) => {
                            last_heard = Instant::now();
                            if state == ClientState::AwaitingFirstContact {
                                info!("streaming started from {}", addr);
                                state = ClientState::Streaming;
                            }

                            // acks are for data only; liveness pings carry
                            // no frame data and get none
                            if !packet.is_control() {
                                let ack = Control::Ack(packet.sequence_id);
                                if let Err(e) = socket.send_to(&ack.encode(), host_addr).await {
                                    warn!("could not ack {}: {}", packet.sequence_id, e);
                                }
                                self.stats.write().record_ack();
                            }

                            monitor.observe(packet.sequence_id);
                            self.stats.write().record_packet();
                        }
                        Err(e) => warn!("discarding datagram from {}: {}", addr, e),
                    }
                }
                Ok(Err(e)) => warn!("receive error: {}", e),
                Err(_) => {} // timeout, fall through to the timers
            }

            if let Some(loss) = monitor.poll_report() {
                info!("{}", loss);
                self.stats.write().record_report(loss.dropped);
            }
        }

        Ok(())
    }

    /// Sends the restart/first-contact sentinel. A failed send is logged
    /// and retried by the silence timer soon enough.
    async fn announce(&self, socket: &UdpSocket, host_addr: SocketAddr) {
        info!("sending host restart");
        if let Err(e) = socket.send_to(&Control::Restart.encode(), host_addr).await {
            warn!("could not reach host {}: {}", host_addr, e);
        }
        self.stats.write().record_restart();
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
