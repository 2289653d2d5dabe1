//! YantraLink engine facade
//!
//! Ties the pieces together: a reader thread drains the inbound byte stream
//! through the decoder into the dispatcher, while command callers go through
//! the [`Commander`] on their own threads.
//!
//! # Thread Model
//!
//! 1. **Reader thread** (`link-reader`, continuous): reads transport chunks,
//!    feeds the stream decoder, routes every decoded frame into the telemetry
//!    store. The transport serializes inbound data into this single consumer.
//! 2. **Caller threads**: build and transmit command frames, then block in
//!    poll-sleep waits on the store. Serialized command issuance (one
//!    in-flight command at a time) is the documented safe usage pattern.

use crate::command::Commander;
use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::protocol::{FrameIdAllocator, StreamDecoder};
use crate::telemetry::TelemetryStore;
use crate::transport::{TcpTransport, Transport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Protocol engine for one device connection
pub struct YantraLink {
    commander: Commander,
    store: Arc<TelemetryStore>,
    shutdown: Arc<AtomicBool>,
    reader_handle: Option<JoinHandle<()>>,
}

impl YantraLink {
    /// Connect to the device over TCP and announce this host's identity
    pub fn connect(config: &AppConfig) -> Result<Self> {
        log::info!("YantraLink: connecting to {}", config.device.address);

        let writer = TcpTransport::connect(&config.device.address)?;
        let reader = writer.try_clone()?;

        let link = Self::from_transports(Box::new(reader), Box::new(writer), config)?;
        link.commander().announce_identity(config.device.machine_id)?;

        log::info!(
            "YantraLink: link established (machine id {})",
            config.device.machine_id
        );
        Ok(link)
    }

    /// Build the engine over pre-opened transport halves
    ///
    /// `reader` is owned by the reader thread; `writer` by the commander.
    /// Used by `connect` and directly by tests/demos with mock transports.
    pub fn from_transports(
        reader: Box<dyn Transport>,
        writer: Box<dyn Transport>,
        config: &AppConfig,
    ) -> Result<Self> {
        let store = Arc::new(TelemetryStore::new());
        let ids = Arc::new(FrameIdAllocator::new());
        let commander = Commander::new(writer, ids, Arc::clone(&store), &config.protocol);

        let shutdown = Arc::new(AtomicBool::new(false));
        let dispatcher = Dispatcher::new(Arc::clone(&store));

        let reader_shutdown = Arc::clone(&shutdown);
        let reader_handle = thread::Builder::new()
            .name("link-reader".to_string())
            .spawn(move || {
                reader_loop(reader, dispatcher, reader_shutdown);
            })
            .map_err(|e| Error::Other(format!("Failed to spawn reader thread: {}", e)))?;

        Ok(Self {
            commander,
            store,
            shutdown,
            reader_handle: Some(reader_handle),
        })
    }

    /// Command interface for this link
    pub fn commander(&self) -> &Commander {
        &self.commander
    }

    /// Telemetry store populated from the inbound stream
    pub fn telemetry(&self) -> &Arc<TelemetryStore> {
        &self.store
    }

    /// Stop the reader thread and release the connection
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        if let Some(handle) = self.reader_handle.take() {
            if handle.join().is_err() {
                log::error!("YantraLink: reader thread panicked");
            }
        }
    }
}

impl Drop for YantraLink {
    fn drop(&mut self) {
        self.shutdown();
        log::info!("YantraLink: shutdown complete");
    }
}

/// Reader loop: transport chunks in, routed frames out
///
/// A read error is logged and retried; only a closed connection or the
/// shutdown flag ends the loop. Decode-level corruption never reaches here -
/// the decoder resynchronizes internally.
fn reader_loop(mut transport: Box<dyn Transport>, dispatcher: Dispatcher, shutdown: Arc<AtomicBool>) {
    let mut decoder = StreamDecoder::new();
    let mut chunk = [0u8; 4096];

    while !shutdown.load(Ordering::Relaxed) {
        match transport.read(&mut chunk) {
            Ok(0) => {
                // No data within the read timeout
                thread::sleep(Duration::from_millis(2));
            }
            Ok(n) => {
                for frame in decoder.feed(&chunk[..n]) {
                    log::debug!(
                        "Frame received: type={} id={} payload={}B",
                        frame.frame_type,
                        frame.id,
                        frame.payload.len()
                    );
                    dispatcher.route(&frame);
                }
            }
            Err(Error::ConnectionClosed) => {
                log::warn!("Device closed the connection");
                break;
            }
            Err(e) => {
                log::error!("Transport read error: {}", e);
                thread::sleep(Duration::from_millis(10));
            }
        }
    }

    log::info!(
        "Reader thread exiting ({} garbage bytes discarded over the session)",
        decoder.dropped_bytes()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ScriptOutcome;
    use crate::protocol::{
        try_decode, Decoded, Frame, STATUS_SUCCESSFUL, TYPE_ACKNOWLEDGE, TYPE_COMPLETE,
        TYPE_MESSAGE, TYPE_SCRIPT,
    };
    use crate::telemetry::{category, field};
    use crate::transport::MockTransport;
    use std::time::Instant;

    fn fast_config() -> AppConfig {
        let mut config = AppConfig::defaults();
        config.protocol.ack_timeout_ms = 1000;
        config.protocol.completion_timeout_ms = 1000;
        config.protocol.poll_interval_ms = 10;
        config
    }

    fn ack_frame(acked_id: u32, code: u32, text: &[u8]) -> Frame {
        let mut p = Vec::new();
        p.extend_from_slice(&acked_id.to_be_bytes());
        p.extend_from_slice(&code.to_be_bytes());
        p.extend_from_slice(&(text.len() as u32).to_be_bytes());
        p.extend_from_slice(text);
        Frame::outbound(TYPE_ACKNOWLEDGE, 1, p)
    }

    fn complete_frame(code: u32, text: &[u8]) -> Frame {
        let mut p = Vec::new();
        p.extend_from_slice(&code.to_be_bytes());
        p.extend_from_slice(&(text.len() as u32).to_be_bytes());
        p.extend_from_slice(text);
        Frame::outbound(TYPE_COMPLETE, 2, p)
    }

    fn message_frame(level: u32, text: &[u8]) -> Frame {
        let mut p = Vec::new();
        p.extend_from_slice(&level.to_be_bytes());
        p.extend_from_slice(&(text.len() as u32).to_be_bytes());
        p.extend_from_slice(text);
        Frame::outbound(TYPE_MESSAGE, 3, p)
    }

    /// Wait for a condition with a deadline, polling fast
    fn wait_until<F: Fn() -> bool>(what: &str, cond: F) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out waiting for {}", what);
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_inbound_stream_reaches_store() {
        let device = MockTransport::new();
        let mut link = YantraLink::from_transports(
            Box::new(device.clone()),
            Box::new(MockTransport::new()),
            &fast_config(),
        )
        .unwrap();

        // Split the frame across two injections to exercise reassembly
        let bytes = message_frame(1, b"stage homed").to_bytes();
        let (head, tail) = bytes.split_at(10);
        device.inject_read(head);
        device.inject_read(tail);

        let store = Arc::clone(link.telemetry());
        wait_until("message telemetry", || {
            store.get_text(category::MESSAGE, field::MESSAGE).is_some()
        });
        assert_eq!(
            store.get_text(category::MESSAGE, field::MESSAGE),
            Some("stage homed".to_string())
        );
        assert_eq!(store.get_u32(category::MESSAGE, field::LEVEL), Some(1));

        link.shutdown();
    }

    #[test]
    fn test_full_command_round_trip() {
        let device_rx = MockTransport::new();
        let device_tx = MockTransport::new();
        let link = YantraLink::from_transports(
            Box::new(device_rx.clone()),
            Box::new(device_tx.clone()),
            &fast_config(),
        )
        .unwrap();

        // Device responder: wait for the script frame, then acknowledge and
        // complete it over the inbound stream
        let responder_rx = device_rx.clone();
        let responder_tx = device_tx.clone();
        let responder = thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(2);
            loop {
                if let Decoded::Frame { frame, .. } = try_decode(&responder_tx.written()) {
                    assert_eq!(frame.frame_type, TYPE_SCRIPT);
                    assert_eq!(
                        frame.payload,
                        b"run(inner_rotation_script(), 45)".to_vec()
                    );
                    responder_rx
                        .inject_read(&ack_frame(frame.id, STATUS_SUCCESSFUL, b"OK").to_bytes());
                    responder_rx.inject_read(&complete_frame(3, b"finished").to_bytes());
                    return;
                }
                assert!(Instant::now() < deadline, "no script frame seen");
                thread::sleep(Duration::from_millis(5));
            }
        });

        let outcome = link.commander().rotate_inner(45).unwrap();
        assert_eq!(outcome, ScriptOutcome::Completed);
        responder.join().unwrap();
    }

    #[test]
    fn test_garbage_then_frame_still_routes() {
        let device = MockTransport::new();
        let mut link = YantraLink::from_transports(
            Box::new(device.clone()),
            Box::new(MockTransport::new()),
            &fast_config(),
        )
        .unwrap();

        device.inject_read(&[0xFF, 0x00, 0xDE, 0xAD]);
        device.inject_read(&ack_frame(12, STATUS_SUCCESSFUL, b"OK").to_bytes());

        let store = Arc::clone(link.telemetry());
        wait_until("acknowledge telemetry", || {
            store.get_u32(category::ACKNOWLEDGE, field::ID) == Some(12)
        });

        link.shutdown();
    }
}
