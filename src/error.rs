//! Error types for YantraLink

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// YantraLink error types
///
/// Malformed wire data never appears here: the stream decoder recovers by
/// resynchronizing on the next sync marker and the engine keeps running.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error (connect, read)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport write failed; the command was not sent
    #[error("Transport write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// No acknowledgment observed for the given command id within the timeout
    #[error("Acknowledge timeout for command id {id} after {waited_ms}ms")]
    AckTimeout {
        /// Frame id of the unacknowledged command
        id: u32,
        /// Wait budget that elapsed
        waited_ms: u64,
    },

    /// No completion notification observed within the timeout
    #[error("Completion timeout after {waited_ms}ms")]
    CompletionTimeout {
        /// Wait budget that elapsed
        waited_ms: u64,
    },

    /// Peer closed the byte stream
    #[error("Connection closed by device")]
    ConnectionClosed,

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration parse error
    #[error("Configuration error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration write error
    #[error("Configuration error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
