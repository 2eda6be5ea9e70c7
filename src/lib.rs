//! # PLP (Packet Loss Probe)
//!
//! UDP one-way stream loss measurement with a liveness restart handshake.
//!
//! ## Core pieces
//! - **Packet codec**: fixed 1310-byte wire layout, network byte order
//! - **Drop monitor**: sliding-window loss detection over sequence ids,
//!   bounded memory, periodic reports
//! - **Restart handshake**: zero-sequence-id sentinel announces a client to
//!   the host and resets both loss windows
//! - **Ack sub-protocol**: the client echoes every received sequence id so
//!   the host can measure downstream delivery from its side
//!
//! No retransmission: lost packets are counted, never recovered.

pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod monitor;
pub mod packet;
pub mod stats;

pub use client::Client;
pub use config::Config;
pub use error::{Error, Result};
pub use host::Host;
pub use monitor::{DropMonitor, LossReport};
pub use packet::{Control, Packet};
pub use stats::ProbeStats;

/// Default host port (the host binds this; clients are told where to aim).
pub const DEFAULT_PORT: u16 = 5940;

/// Payload capacity of a data packet (bytes).
pub const PACKET_CONTENT_SIZE: usize = 1300;

/// Wire size of a serialized data packet: 10-byte header + content.
pub const SERIALIZED_PACKET_SIZE: usize = PACKET_CONTENT_SIZE + 10;

/// Wire size of a control datagram (restart sentinel or ack).
pub const CONTROL_SIZE: usize = 4;

/// Sequence id reserved for the restart/first-contact sentinel.
pub const RESTART_SENTINEL: u32 = 0;

/// Trailing span of sequence ids kept in the drop monitor before
/// aging out (in sequence numbers, relative to the highest seen).
pub const DEFAULT_WINDOW: u32 = 2;
