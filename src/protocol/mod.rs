//! Wire protocol: frame codec, stream decoder, and id allocation
//!
//! # Frame Layout
//!
//! Every frame on the wire carries a fixed 32-byte header followed by a raw
//! payload. All multi-byte fields are big-endian:
//!
//! ```text
//! ┌────────┬──────┬─────────────────────────────────┐
//! │ Offset │ Size │ Field                           │
//! ├────────┼──────┼─────────────────────────────────┤
//! │ 0      │ 4    │ sync marker = 0xDEADBEEF        │
//! │ 4      │ 4    │ type tag (u32)                  │
//! │ 8      │ 4    │ frame id (u32, sender-assigned) │
//! │ 12     │ 8    │ session time (f64, unix secs)   │
//! │ 20     │ 8    │ frame time (f64, unix secs)     │
//! │ 28     │ 4    │ payload length (u32)            │
//! │ 32     │ N    │ payload bytes                   │
//! └────────┴──────┴─────────────────────────────────┘
//! ```
//!
//! There is no checksum. Corruption recovery relies entirely on the sync
//! marker: the decoder discards any bytes preceding the earliest marker and
//! resumes parsing there.
//!
//! ## Payload Layouts
//!
//! Inbound (device to host):
//! - MESSAGE: `{level: u32, text_len: u32, text}` (trailing NULs stripped)
//! - ACKNOWLEDGE: `{acked_id: u32, code: u32, text_len: u32, text}`
//! - COMPLETE: `{code: u32, text_len: u32, text}`
//!
//! Outbound (host to device):
//! - IDENTITY: `{machine_id: u32}`
//! - SCRIPT: UTF-8 text of the form `run(<script>(), <parameter>)`
//! - CONTROL: free-form UTF-8 control text

mod decoder;
mod frame;
mod ids;

pub use decoder::StreamDecoder;
pub use frame::{encode_command, try_decode, Decoded, Frame};
pub(crate) use frame::read_u32;
pub use ids::FrameIdAllocator;

/// Frame sync marker, serialized big-endian as `DE AD BE EF`
pub const SYNC_WORD: u32 = 0xDEAD_BEEF;

/// Fixed header size in bytes (sync through payload length)
pub const HEADER_SIZE: usize = 32;

// Frame type tags
pub const TYPE_ACKNOWLEDGE: u32 = 0;
pub const TYPE_MESSAGE: u32 = 4;
pub const TYPE_SCRIPT: u32 = 6;
pub const TYPE_CONTROL: u32 = 8;
pub const TYPE_IDENTITY: u32 = 10;
pub const TYPE_COMPLETE: u32 = 12;

// Status codes carried by ACKNOWLEDGE and COMPLETE frames.
// Other values are reserved by the device firmware.
pub const STATUS_SUCCESSFUL: u32 = 0;
pub const STATUS_ABORTED: u32 = 1;
pub const STATUS_EXCEPTION: u32 = 2;
