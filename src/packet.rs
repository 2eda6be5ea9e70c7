//! Wire format for data packets and control datagrams.
//!
//! Fixed layout, all integers big-endian (network order) — this is a
//! wire-compatibility requirement, interoperability tests depend on the
//! exact byte positions:
//!
//! | offset | size | field       |
//! |--------|------|-------------|
//! | 0      | 2    | frame_id    |
//! | 2      | 2    | num_packets |
//! | 4      | 4    | sequence_id |
//! | 8      | 2    | data_length |
//! | 10     | 1300 | content     |

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::{CONTROL_SIZE, PACKET_CONTENT_SIZE, RESTART_SENTINEL, SERIALIZED_PACKET_SIZE};

/// One datagram-sized unit of a logical frame.
///
/// `num_packets` is the total packet count of the frame this packet belongs
/// to; zero is reserved and marks a control packet carrying no frame data.
/// `sequence_id` is the stream-wide counter used for loss detection and
/// acknowledgment, independent of frame boundaries.
#[derive(Debug, Clone)]
pub struct Packet {
    pub frame_id: u16,
    pub num_packets: u16,
    pub sequence_id: u32,
    pub data_length: u16,
    pub content: Bytes,
}

impl Packet {
    /// Builds a data packet around `payload`.
    ///
    /// Fails if the payload exceeds the content capacity; this is the only
    /// place the `data_length <= capacity` invariant is enforced.
    pub fn data(frame_id: u16, num_packets: u16, sequence_id: u32, payload: &[u8]) -> Result<Self> {
        if payload.len() > PACKET_CONTENT_SIZE {
            return Err(Error::PayloadTooLarge {
                len: payload.len(),
                capacity: PACKET_CONTENT_SIZE,
            });
        }

        Ok(Self {
            frame_id,
            num_packets,
            sequence_id,
            data_length: payload.len() as u16,
            content: Bytes::copy_from_slice(payload),
        })
    }

    /// A zero-payload data packet, the host's probe unit.
    pub fn probe(sequence_id: u32) -> Self {
        Self {
            frame_id: 0,
            num_packets: 1,
            sequence_id,
            data_length: 0,
            content: Bytes::new(),
        }
    }

    /// A control packet (`num_packets = 0`) carrying only a sequence id.
    pub fn control(sequence_id: u32) -> Self {
        Self {
            frame_id: 0,
            num_packets: 0,
            sequence_id,
            data_length: 0,
            content: Bytes::new(),
        }
    }

    /// Whether this packet carries no frame data.
    pub fn is_control(&self) -> bool {
        self.num_packets == 0
    }

    /// The meaningful bytes of the content buffer.
    pub fn payload(&self) -> &[u8] {
        let len = (self.data_length as usize).min(self.content.len());
        &self.content[..len]
    }

    /// Serializes to the full fixed wire size; content is zero-padded out
    /// to capacity so every data packet is exactly 1310 bytes on the wire.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(SERIALIZED_PACKET_SIZE);
        buf.put_u16(self.frame_id);
        buf.put_u16(self.num_packets);
        buf.put_u32(self.sequence_id);
        buf.put_u16(self.data_length);

        let copy = self.content.len().min(PACKET_CONTENT_SIZE);
        buf.put_slice(&self.content[..copy]);
        buf.put_bytes(0, PACKET_CONTENT_SIZE - copy);

        buf.freeze()
    }

    /// Inverse of [`encode`](Self::encode).
    ///
    /// A truncated receive must never be decoded, so anything shorter than
    /// the fixed wire size is rejected outright. Field values are not range
    /// checked; an inconsistent `data_length` is the encoder's bug, not
    /// ours to repair.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < SERIALIZED_PACKET_SIZE {
            return Err(Error::MalformedPacket {
                expected: SERIALIZED_PACKET_SIZE,
                got: buf.len(),
            });
        }

        let mut cursor = buf;
        let frame_id = cursor.get_u16();
        let num_packets = cursor.get_u16();
        let sequence_id = cursor.get_u32();
        let data_length = cursor.get_u16();
        let content = Bytes::copy_from_slice(&cursor[..PACKET_CONTENT_SIZE]);

        Ok(Self {
            frame_id,
            num_packets,
            sequence_id,
            data_length,
            content,
        })
    }
}

/* metadata-only comparison; content is deliberately excluded */
impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        self.frame_id == other.frame_id
            && self.num_packets == other.num_packets
            && self.sequence_id == other.sequence_id
    }
}

impl Eq for Packet {}

/// A 4-byte client-to-host control datagram: a big-endian sequence id.
///
/// Zero is the restart/first-contact sentinel; any other value acknowledges
/// a just-received data packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Restart,
    Ack(u32),
}

impl Control {
    pub fn encode(&self) -> [u8; CONTROL_SIZE] {
        let seq = match self {
            Control::Restart => RESTART_SENTINEL,
            Control::Ack(seq) => *seq,
        };
        seq.to_be_bytes()
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != CONTROL_SIZE {
            return Err(Error::MalformedControl {
                expected: CONTROL_SIZE,
                got: buf.len(),
            });
        }

        let seq = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if seq == RESTART_SENTINEL {
            Ok(Control::Restart)
        } else {
            Ok(Control::Ack(seq))
        }
    }
}
