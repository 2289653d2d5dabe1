//! Quick demo: run a scripted rotation against a simulated device
//!
//! No hardware needed - a responder thread plays the device over a mock
//! transport pair, acknowledging and completing the script command.
//!
//! Run with: `cargo run --example quick_demo`

use std::thread;
use std::time::{Duration, Instant};
use yantra_link::protocol::{
    try_decode, Decoded, Frame, STATUS_SUCCESSFUL, TYPE_ACKNOWLEDGE, TYPE_COMPLETE, TYPE_MESSAGE,
    TYPE_SCRIPT,
};
use yantra_link::transport::MockTransport;
use yantra_link::{AppConfig, YantraLink};

fn text_payload_frame(frame_type: u32, lead_fields: &[u32], text: &[u8], id: u32) -> Frame {
    let mut payload = Vec::new();
    for value in lead_fields {
        payload.extend_from_slice(&value.to_be_bytes());
    }
    payload.extend_from_slice(&(text.len() as u32).to_be_bytes());
    payload.extend_from_slice(text);
    Frame::outbound(frame_type, id, payload)
}

/// Scan the host's written bytes for the first SCRIPT frame
fn find_script_frame(written: &[u8]) -> Option<Frame> {
    let mut rest = written;
    while let Decoded::Frame { frame, consumed } = try_decode(rest) {
        if frame.frame_type == TYPE_SCRIPT {
            return Some(frame);
        }
        rest = &rest[consumed..];
    }
    None
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = AppConfig::defaults();
    config.protocol.poll_interval_ms = 50;

    // Mock transport pair: the engine reads from `device_rx` and writes to
    // `device_tx`; the responder thread does the reverse.
    let device_rx = MockTransport::new();
    let device_tx = MockTransport::new();

    let responder_rx = device_rx.clone();
    let responder_tx = device_tx.clone();
    let responder = thread::spawn(move || {
        // Greet the host, then wait for a script command
        responder_rx.inject_read(
            &text_payload_frame(TYPE_MESSAGE, &[1], b"stage controller online", 1).to_bytes(),
        );

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(frame) = find_script_frame(&responder_tx.written()) {
                println!(
                    "[device] script received: {}",
                    String::from_utf8_lossy(&frame.payload)
                );

                // Acknowledge, pretend to rotate, then complete
                responder_rx.inject_read(
                    &text_payload_frame(
                        TYPE_ACKNOWLEDGE,
                        &[frame.id, STATUS_SUCCESSFUL],
                        b"accepted",
                        2,
                    )
                    .to_bytes(),
                );
                thread::sleep(Duration::from_millis(400));
                responder_rx
                    .inject_read(&text_payload_frame(TYPE_COMPLETE, &[3], b"done", 3).to_bytes());
                return;
            }
            if Instant::now() > deadline {
                eprintln!("[device] no script command arrived");
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
    });

    let link = YantraLink::from_transports(Box::new(device_rx), Box::new(device_tx), &config)
        .expect("engine start");

    println!("[host] rotating inner stage by 45 degrees...");
    match link.commander().rotate_inner(45) {
        Ok(outcome) => println!("[host] outcome: {:?}", outcome),
        Err(e) => eprintln!("[host] command failed: {}", e),
    }

    responder.join().expect("responder thread");
}
