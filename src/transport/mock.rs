//! Mock transport for tests and demos

use super::Transport;
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// In-memory transport with injectable reads and captured writes
///
/// Clones share the same buffers, so one clone can act as the engine's
/// endpoint while another plays the device: inject bytes to be read on one,
/// inspect what the engine wrote on the other.
#[derive(Clone, Default)]
pub struct MockTransport {
    rx: Arc<Mutex<VecDeque<u8>>>,
    tx: Arc<Mutex<Vec<u8>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the engine to read
    pub fn inject_read(&self, data: &[u8]) {
        self.rx.lock().extend(data.iter().copied());
    }

    /// All bytes written so far
    pub fn written(&self) -> Vec<u8> {
        self.tx.lock().clone()
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut rx = self.rx.lock();
        let available = rx.len().min(buffer.len());
        for slot in buffer.iter_mut().take(available) {
            *slot = rx.pop_front().unwrap_or(0);
        }
        Ok(available)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.tx.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
