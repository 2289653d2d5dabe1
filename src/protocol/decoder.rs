//! Stream decoder: byte-stream reassembly into frames
//!
//! The transport delivers arbitrary-sized chunks (a TCP read boundary has no
//! relation to frame boundaries). The decoder owns a single growing buffer,
//! appends each arrival, and extracts every complete frame. The caller must
//! serialize calls into `feed` - there is exactly one logical consumer of the
//! inbound stream.

use super::frame::{try_decode, Decoded, Frame};
use super::HEADER_SIZE;

/// Stateful frame extractor over a growing decode buffer
///
/// The buffer is unbounded: the wire has no length cap and no checksum, so
/// unmatched bytes are held until a sync marker arrives. Bytes
/// are consumed exactly once - a consumed prefix is never re-examined, and
/// unconsumed bytes survive verbatim across calls.
pub struct StreamDecoder {
    buffer: Vec<u8>,
    /// Total garbage bytes discarded during resynchronization
    dropped_bytes: u64,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            dropped_bytes: 0,
        }
    }

    /// Append `data` and extract every frame that is now complete
    ///
    /// Each successful decode strictly shrinks the buffer, so the loop always
    /// terminates. No frame is returned twice and no byte lands in two
    /// frames.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        loop {
            match try_decode(&self.buffer) {
                Decoded::Frame { frame, consumed } => {
                    let garbage = consumed - HEADER_SIZE - frame.payload.len();
                    if garbage > 0 {
                        self.dropped_bytes += garbage as u64;
                        log::debug!(
                            "Resync: discarded {} bytes before sync marker ({} total)",
                            garbage,
                            self.dropped_bytes
                        );
                    }
                    self.buffer.drain(..consumed);
                    frames.push(frame);
                }
                Decoded::NeedMoreData => break,
            }
        }
        frames
    }

    /// Bytes buffered but not yet consumed
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Total garbage bytes discarded so far
    pub fn dropped_bytes(&self) -> u64 {
        self.dropped_bytes
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}
