//! Dispatcher: routes decoded frames into the telemetry store
//!
//! Each recognized frame type becomes one atomic record write in its own
//! telemetry category. Unrecognized tags and short payloads are logged and
//! dropped - inbound corruption is never fatal to the engine.

use crate::protocol::{read_u32, Frame, TYPE_ACKNOWLEDGE, TYPE_COMPLETE, TYPE_MESSAGE};
use crate::telemetry::{category, field, TelemetryStore, TelemetryValue};
use std::sync::Arc;

/// Routes inbound frames to telemetry categories
///
/// Sole writer of the [`TelemetryStore`].
pub struct Dispatcher {
    store: Arc<TelemetryStore>,
}

impl Dispatcher {
    pub fn new(store: Arc<TelemetryStore>) -> Self {
        Self { store }
    }

    /// Route one decoded frame by type tag
    pub fn route(&self, frame: &Frame) {
        match frame.frame_type {
            TYPE_MESSAGE => self.route_message(frame),
            TYPE_ACKNOWLEDGE => self.route_acknowledge(frame),
            TYPE_COMPLETE => self.route_complete(frame),
            other => {
                log::warn!(
                    "Dropping frame with unrecognized type tag {} (id={}, {} payload bytes)",
                    other,
                    frame.id,
                    frame.payload.len()
                );
            }
        }
    }

    /// MESSAGE payload: {level: u32, text_len: u32, text}
    fn route_message(&self, frame: &Frame) {
        let payload = &frame.payload;
        if payload.len() < 8 {
            log::warn!("Short MESSAGE payload ({} bytes), dropped", payload.len());
            return;
        }

        let level = read_u32(payload, 0);
        let text = decode_text(payload, 8, read_u32(payload, 4));
        log::debug!("Device message (level {}): {}", level, text);

        self.store.set_record(
            category::MESSAGE,
            vec![
                (field::LEVEL, TelemetryValue::U32(level)),
                (field::MESSAGE, TelemetryValue::Text(text)),
            ],
        );
    }

    /// ACKNOWLEDGE payload: {acked_id: u32, code: u32, text_len: u32, text}
    fn route_acknowledge(&self, frame: &Frame) {
        let payload = &frame.payload;
        if payload.len() < 12 {
            log::warn!(
                "Short ACKNOWLEDGE payload ({} bytes), dropped",
                payload.len()
            );
            return;
        }

        let acked_id = read_u32(payload, 0);
        let code = read_u32(payload, 4);
        let text = decode_text(payload, 12, read_u32(payload, 8));
        log::debug!("Acknowledge: id={} code={} \"{}\"", acked_id, code, text);

        self.store.set_record(
            category::ACKNOWLEDGE,
            vec![
                (field::ID, TelemetryValue::U32(acked_id)),
                (field::CODE, TelemetryValue::U32(code)),
                (field::MESSAGE, TelemetryValue::Text(text)),
            ],
        );
    }

    /// COMPLETE payload: {code: u32, text_len: u32, text}
    ///
    /// Carries no frame id: completion correlates to the most recent
    /// outstanding script command by protocol convention.
    fn route_complete(&self, frame: &Frame) {
        let payload = &frame.payload;
        if payload.len() < 8 {
            log::warn!("Short COMPLETE payload ({} bytes), dropped", payload.len());
            return;
        }

        let code = read_u32(payload, 0);
        let text = decode_text(payload, 8, read_u32(payload, 4));
        log::debug!("Complete: code={} \"{}\"", code, text);

        self.store.set_record(
            category::COMPLETE,
            vec![
                (field::CODE, TelemetryValue::U32(code)),
                (field::MESSAGE, TelemetryValue::Text(text)),
            ],
        );
    }
}

/// Decode declared-length text at `at`, clamped to the payload, with trailing
/// NUL padding stripped
fn decode_text(payload: &[u8], at: usize, declared_len: u32) -> String {
    let start = at.min(payload.len());
    let end = (at + declared_len as usize).min(payload.len());
    let raw = &payload[start..end];
    let trimmed = raw
        .iter()
        .rposition(|&b| b != 0)
        .map(|i| &raw[..=i])
        .unwrap_or(&[]);
    String::from_utf8_lossy(trimmed).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TYPE_SCRIPT;

    fn ack_payload(acked_id: u32, code: u32, text: &[u8]) -> Vec<u8> {
        let mut p = Vec::new();
        p.extend_from_slice(&acked_id.to_be_bytes());
        p.extend_from_slice(&code.to_be_bytes());
        p.extend_from_slice(&(text.len() as u32).to_be_bytes());
        p.extend_from_slice(text);
        p
    }

    fn message_payload(level: u32, text: &[u8]) -> Vec<u8> {
        let mut p = Vec::new();
        p.extend_from_slice(&level.to_be_bytes());
        p.extend_from_slice(&(text.len() as u32).to_be_bytes());
        p.extend_from_slice(text);
        p
    }

    fn complete_payload(code: u32, text: &[u8]) -> Vec<u8> {
        let mut p = Vec::new();
        p.extend_from_slice(&code.to_be_bytes());
        p.extend_from_slice(&(text.len() as u32).to_be_bytes());
        p.extend_from_slice(text);
        p
    }

    #[test]
    fn test_acknowledge_populates_store() {
        let store = Arc::new(TelemetryStore::new());
        let dispatcher = Dispatcher::new(Arc::clone(&store));

        let frame = Frame::outbound(TYPE_ACKNOWLEDGE, 100, ack_payload(3, 0, b"OK"));
        dispatcher.route(&frame);

        assert_eq!(store.get_u32(category::ACKNOWLEDGE, field::ID), Some(3));
        assert_eq!(store.get_u32(category::ACKNOWLEDGE, field::CODE), Some(0));
        assert_eq!(
            store.get_text(category::ACKNOWLEDGE, field::MESSAGE),
            Some("OK".to_string())
        );
    }

    #[test]
    fn test_message_strips_trailing_nuls() {
        let store = Arc::new(TelemetryStore::new());
        let dispatcher = Dispatcher::new(Arc::clone(&store));

        let frame = Frame::outbound(TYPE_MESSAGE, 1, message_payload(2, b"axis ready\0\0\0"));
        dispatcher.route(&frame);

        assert_eq!(store.get_u32(category::MESSAGE, field::LEVEL), Some(2));
        assert_eq!(
            store.get_text(category::MESSAGE, field::MESSAGE),
            Some("axis ready".to_string())
        );
    }

    #[test]
    fn test_complete_populates_store() {
        let store = Arc::new(TelemetryStore::new());
        let dispatcher = Dispatcher::new(Arc::clone(&store));

        let frame = Frame::outbound(TYPE_COMPLETE, 1, complete_payload(2, b"script raised"));
        dispatcher.route(&frame);

        assert_eq!(store.get_u32(category::COMPLETE, field::CODE), Some(2));
        assert_eq!(
            store.get_text(category::COMPLETE, field::MESSAGE),
            Some("script raised".to_string())
        );
    }

    #[test]
    fn test_unknown_tag_dropped() {
        let store = Arc::new(TelemetryStore::new());
        let dispatcher = Dispatcher::new(Arc::clone(&store));

        dispatcher.route(&Frame::outbound(77, 1, vec![1, 2, 3]));
        dispatcher.route(&Frame::outbound(TYPE_SCRIPT, 2, b"echoed?".to_vec()));

        assert!(store.snapshot(category::MESSAGE).is_none());
        assert!(store.snapshot(category::ACKNOWLEDGE).is_none());
        assert!(store.snapshot(category::COMPLETE).is_none());
    }

    #[test]
    fn test_short_payload_dropped() {
        let store = Arc::new(TelemetryStore::new());
        let dispatcher = Dispatcher::new(Arc::clone(&store));

        dispatcher.route(&Frame::outbound(TYPE_ACKNOWLEDGE, 1, vec![0, 0, 0]));
        assert!(store.snapshot(category::ACKNOWLEDGE).is_none());
    }

    #[test]
    fn test_declared_length_clamped_to_payload() {
        let store = Arc::new(TelemetryStore::new());
        let dispatcher = Dispatcher::new(Arc::clone(&store));

        // Declared text length exceeds the actual payload; take what exists
        let mut p = Vec::new();
        p.extend_from_slice(&1u32.to_be_bytes());
        p.extend_from_slice(&100u32.to_be_bytes());
        p.extend_from_slice(b"short");
        dispatcher.route(&Frame::outbound(TYPE_MESSAGE, 1, p));

        assert_eq!(
            store.get_text(category::MESSAGE, field::MESSAGE),
            Some("short".to_string())
        );
    }
}
