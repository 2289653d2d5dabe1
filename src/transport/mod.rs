//! Transport layer for I/O abstraction
//!
//! The engine never touches a socket directly; it reads and writes through
//! this trait so tests can substitute [`MockTransport`].

use crate::error::{Error, Result};

mod mock;
mod tcp;

pub use mock::MockTransport;
pub use tcp::TcpTransport;

/// Byte-stream transport for device communication
///
/// `read` returning `Ok(0)` means "no data right now" (e.g. a read timeout),
/// not end of stream; a closed peer surfaces as [`Error::ConnectionClosed`].
pub trait Transport: Send {
    /// Read available data into `buffer`, returning the byte count
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Write data from `buffer`, returning the byte count written
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Flush any pending writes (blocking until complete)
    fn flush(&mut self) -> Result<()>;

    /// Write the whole buffer, retrying short writes
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut sent = 0;
        while sent < data.len() {
            let n = self.write(&data[sent..])?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            sent += n;
        }
        Ok(())
    }
}
