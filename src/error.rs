//! Error types.

use thiserror::Error;

/// PLP protocol error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed packet: need {expected} bytes, got {got}")]
    MalformedPacket { expected: usize, got: usize },

    #[error("malformed control datagram: need {expected} bytes, got {got}")]
    MalformedControl { expected: usize, got: usize },

    #[error("payload too large: {len} bytes exceeds capacity {capacity}")]
    PayloadTooLarge { len: usize, capacity: usize },

    #[error("event channel closed")]
    ChannelClosed,
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
