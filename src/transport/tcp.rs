//! TCP transport implementation

use super::Transport;
use crate::error::{Error, Result};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// Read timeout so the reader thread can observe the shutdown flag
const READ_TIMEOUT_MS: u64 = 50;

/// TCP transport for the device byte stream
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connect to the device
    ///
    /// # Arguments
    /// * `addr` - Device address (e.g., "192.168.1.40:4660")
    pub fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(Duration::from_millis(READ_TIMEOUT_MS)))?;

        log::info!("Connected to device at {}", addr);
        Ok(Self { stream })
    }

    /// Clone the underlying stream so one half can read while the other
    /// writes
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            stream: self.stream.try_clone()?,
        })
    }
}

impl Transport for TcpTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        match self.stream.read(buffer) {
            Ok(0) => Err(Error::ConnectionClosed),
            Ok(n) => Ok(n),
            Err(e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::WouldBlock =>
            {
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.stream.write(data)?)
    }

    fn flush(&mut self) -> Result<()> {
        self.stream.flush()?;
        Ok(())
    }
}
