//! Frame codec: fixed-header binary encode/decode
//!
//! Pure functions over byte slices. Buffer ownership and the
//! accumulate-and-extract loop live in [`super::StreamDecoder`].

use super::ids::FrameIdAllocator;
use super::{HEADER_SIZE, SYNC_WORD};
use std::time::{SystemTime, UNIX_EPOCH};

/// One complete protocol frame (header fields + payload)
///
/// Immutable once constructed, whether parsed off the wire or built for
/// transmission. `payload.len()` always equals the on-wire payload length.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Type tag (see the `TYPE_*` constants)
    pub frame_type: u32,
    /// Sender-assigned frame id
    pub id: u32,
    /// Session time, seconds since the unix epoch
    pub session_time: f64,
    /// Frame time, seconds since the unix epoch
    pub frame_time: f64,
    /// Raw payload bytes
    pub payload: Vec<u8>,
}

impl Frame {
    /// Build an outbound frame, stamping both time fields from a single
    /// wall-clock read.
    pub fn outbound(frame_type: u32, id: u32, payload: Vec<u8>) -> Self {
        let now = unix_time();
        Self {
            frame_type,
            id,
            session_time: now,
            frame_time: now,
            payload,
        }
    }

    /// Serialize header + payload for transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        bytes.extend_from_slice(&SYNC_WORD.to_be_bytes());
        bytes.extend_from_slice(&self.frame_type.to_be_bytes());
        bytes.extend_from_slice(&self.id.to_be_bytes());
        bytes.extend_from_slice(&self.session_time.to_be_bytes());
        bytes.extend_from_slice(&self.frame_time.to_be_bytes());
        bytes.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}

/// Outcome of a decode attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A complete frame, plus the byte count to discard from the front of
    /// the buffer (any garbage prefix + header + payload)
    Frame { frame: Frame, consumed: usize },
    /// Not enough bytes yet; the buffer must be preserved as-is
    NeedMoreData,
}

/// Encode a command frame, allocating its id
///
/// Returns the assigned id alongside the wire bytes so the caller can
/// correlate the acknowledgment later.
pub fn encode_command(ids: &FrameIdAllocator, frame_type: u32, payload: &[u8]) -> (u32, Vec<u8>) {
    let id = ids.next();
    let frame = Frame::outbound(frame_type, id, payload.to_vec());
    (id, frame.to_bytes())
}

/// Try to decode the first complete frame in `buf`
///
/// Scans for the earliest sync marker; bytes before it are folded into the
/// consumed count so a malformed prefix never blocks forward progress. If the
/// marker, header, or payload is incomplete the buffer is left untouched and
/// `NeedMoreData` is returned.
pub fn try_decode(buf: &[u8]) -> Decoded {
    let Some(sync) = find_sync(buf) else {
        return Decoded::NeedMoreData;
    };

    if buf.len() - sync < HEADER_SIZE {
        return Decoded::NeedMoreData;
    }

    let frame_type = read_u32(buf, sync + 4);
    let id = read_u32(buf, sync + 8);
    let session_time = read_f64(buf, sync + 12);
    let frame_time = read_f64(buf, sync + 20);
    let payload_len = read_u32(buf, sync + 28) as usize;

    if buf.len() - sync < HEADER_SIZE + payload_len {
        return Decoded::NeedMoreData;
    }

    let start = sync + HEADER_SIZE;
    let frame = Frame {
        frame_type,
        id,
        session_time,
        frame_time,
        payload: buf[start..start + payload_len].to_vec(),
    };

    Decoded::Frame {
        frame,
        consumed: sync + HEADER_SIZE + payload_len,
    }
}

/// Find the earliest sync marker position
fn find_sync(buf: &[u8]) -> Option<usize> {
    if buf.len() < 4 {
        return None;
    }
    let marker = SYNC_WORD.to_be_bytes();
    buf.windows(4).position(|w| w == marker)
}

/// Current wall clock as fractional seconds since the unix epoch
fn unix_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Read a big-endian u32 at `at` (caller guarantees bounds)
pub(crate) fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Read a big-endian f64 at `at` (caller guarantees bounds)
fn read_f64(buf: &[u8], at: usize) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[at..at + 8]);
    f64::from_be_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::super::{TYPE_MESSAGE, TYPE_SCRIPT};
    use super::*;

    #[test]
    fn test_header_layout() {
        let frame = Frame {
            frame_type: TYPE_SCRIPT,
            id: 0x01020304,
            session_time: 1.5,
            frame_time: 2.5,
            payload: vec![0xAA, 0xBB],
        };
        let bytes = frame.to_bytes();

        assert_eq!(bytes.len(), HEADER_SIZE + 2);
        assert_eq!(&bytes[0..4], &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(read_u32(&bytes, 4), TYPE_SCRIPT);
        assert_eq!(read_u32(&bytes, 8), 0x01020304);
        assert_eq!(read_f64(&bytes, 12), 1.5);
        assert_eq!(read_f64(&bytes, 20), 2.5);
        assert_eq!(read_u32(&bytes, 28), 2);
        assert_eq!(&bytes[32..], &[0xAA, 0xBB]);
    }

    #[test]
    fn test_round_trip() {
        let frame = Frame::outbound(TYPE_MESSAGE, 42, b"hello device".to_vec());
        let bytes = frame.to_bytes();

        match try_decode(&bytes) {
            Decoded::Frame { frame: decoded, consumed } => {
                assert_eq!(decoded, frame);
                assert_eq!(consumed, bytes.len());
            }
            Decoded::NeedMoreData => panic!("expected a complete frame"),
        }
    }

    #[test]
    fn test_encode_command_returns_id() {
        let ids = FrameIdAllocator::new();
        let (id, bytes) = encode_command(&ids, TYPE_SCRIPT, b"run(x(), 1)");
        assert_eq!(id, 1);
        assert_eq!(read_u32(&bytes, 8), 1);

        let (id2, _) = encode_command(&ids, TYPE_SCRIPT, b"run(x(), 2)");
        assert_eq!(id2, 2);
    }

    #[test]
    fn test_truncated_header_needs_more() {
        let bytes = Frame::outbound(TYPE_MESSAGE, 1, vec![]).to_bytes();
        for cut in 0..HEADER_SIZE {
            assert_eq!(try_decode(&bytes[..cut]), Decoded::NeedMoreData);
        }
    }

    #[test]
    fn test_truncated_payload_needs_more() {
        let bytes = Frame::outbound(TYPE_MESSAGE, 1, vec![1, 2, 3, 4]).to_bytes();
        assert_eq!(try_decode(&bytes[..bytes.len() - 1]), Decoded::NeedMoreData);
    }

    #[test]
    fn test_garbage_prefix_consumed() {
        let mut bytes = vec![0x00, 0xFF, 0xDE, 0xAD, 0x01];
        let frame = Frame::outbound(TYPE_MESSAGE, 9, b"ok".to_vec());
        bytes.extend_from_slice(&frame.to_bytes());

        match try_decode(&bytes) {
            Decoded::Frame { frame: decoded, consumed } => {
                assert_eq!(decoded.id, 9);
                assert_eq!(consumed, bytes.len());
            }
            Decoded::NeedMoreData => panic!("expected a frame past the garbage"),
        }
    }

    #[test]
    fn test_no_sync_needs_more() {
        assert_eq!(try_decode(&[0x01, 0x02]), Decoded::NeedMoreData);
        assert_eq!(try_decode(&[0u8; 64]), Decoded::NeedMoreData);
    }
}
