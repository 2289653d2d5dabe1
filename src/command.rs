//! Command/response correlator
//!
//! Outbound commands are encoded with a fresh frame id and written to the
//! transport; correlation happens by polling the telemetry store, which the
//! dispatcher populates from the inbound stream. Waits are plain poll-sleep
//! loops with wall-clock deadlines: worst-case wake latency is bounded by the
//! poll interval.
//!
//! # Usage Precondition
//!
//! The store holds only the latest acknowledgment and completion. Concurrent
//! in-flight commands can overwrite each other's responses before a slow
//! caller polls, and COMPLETE frames carry no id at all, so they correlate to
//! the most recent script command purely by recency. Issue one command at a
//! time; the engine does not enforce this.

use crate::config::ProtocolConfig;
use crate::error::{Error, Result};
use crate::protocol::{
    encode_command, FrameIdAllocator, STATUS_ABORTED, STATUS_EXCEPTION, STATUS_SUCCESSFUL,
    TYPE_CONTROL, TYPE_IDENTITY, TYPE_SCRIPT,
};
use crate::telemetry::{category, field, TelemetryStore};
use crate::transport::Transport;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a fully-run script command
///
/// Together with [`Error::AckTimeout`] and [`Error::CompletionTimeout`] this
/// makes five distinct, independently observable outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// Acknowledged and completed without a failure code
    Completed,
    /// Device rejected the command at acknowledge time; completion was not
    /// awaited
    Rejected {
        /// Non-success acknowledge status code
        code: u32,
    },
    /// Script ran but finished with a failure code (aborted or exception)
    Failed {
        /// Completion status code
        code: u32,
    },
}

impl ScriptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ScriptOutcome::Completed)
    }
}

/// Sends command frames and waits for correlated responses
pub struct Commander {
    transport: Arc<Mutex<Box<dyn Transport>>>,
    ids: Arc<FrameIdAllocator>,
    store: Arc<TelemetryStore>,
    ack_timeout: Duration,
    completion_timeout: Duration,
    poll_interval: Duration,
}

impl Commander {
    pub fn new(
        transport: Box<dyn Transport>,
        ids: Arc<FrameIdAllocator>,
        store: Arc<TelemetryStore>,
        protocol: &ProtocolConfig,
    ) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            ids,
            store,
            ack_timeout: protocol.ack_timeout(),
            completion_timeout: protocol.completion_timeout(),
            poll_interval: protocol.poll_interval(),
        }
    }

    /// Encode and transmit a command frame, returning the assigned id
    ///
    /// A write failure means the command was not sent; the engine stays
    /// usable for subsequent commands.
    pub fn send_command(&self, frame_type: u32, payload: &[u8]) -> Result<u32> {
        let (id, bytes) = encode_command(&self.ids, frame_type, payload);

        let mut transport = self.transport.lock();
        transport
            .write_all(&bytes)
            .and_then(|_| transport.flush())
            .map_err(|e| match e {
                Error::Io(io) => Error::WriteFailed(io),
                other => other,
            })?;

        log::debug!(
            "Sent frame: type={} id={} payload={}B",
            frame_type,
            id,
            payload.len()
        );
        Ok(id)
    }

    /// Wait until the device acknowledges frame `id`, returning the status
    /// code
    ///
    /// Polls the acknowledge category at the configured interval. If another
    /// command's acknowledgment overwrites this one before a poll observes
    /// it, the wait times out - an accepted limitation of the last-value-wins
    /// store, not masked here.
    pub fn await_acknowledge(&self, id: u32, timeout: Duration) -> Result<u32> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(record) = self.store.snapshot(category::ACKNOWLEDGE) {
                let acked = record.get(field::ID).and_then(|v| v.as_u32());
                if acked == Some(id) {
                    let code = record
                        .get(field::CODE)
                        .and_then(|v| v.as_u32())
                        .unwrap_or(STATUS_EXCEPTION);
                    return Ok(code);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(Error::AckTimeout {
                    id,
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }

    /// Wait for a completion notification, returning its status code
    ///
    /// Code zero doubles as the "no completion yet" sentinel on the wire, so
    /// the poll runs until a non-zero code appears.
    pub fn await_completion(&self, timeout: Duration) -> Result<u32> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(record) = self.store.snapshot(category::COMPLETE) {
                if let Some(code) = record.get(field::CODE).and_then(|v| v.as_u32()) {
                    if code != 0 {
                        return Ok(code);
                    }
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(Error::CompletionTimeout {
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }

    /// Run a device script end to end
    ///
    /// Sends `run(<script>(), <parameter>)` as a SCRIPT frame, waits for the
    /// acknowledgment (failing fast on rejection without awaiting
    /// completion), then waits for the completion notification. Completion
    /// codes ABORTED and EXCEPTION map to [`ScriptOutcome::Failed`]; any
    /// other non-zero code is the device's completion signal for a
    /// successful run.
    pub fn run_script<P: fmt::Display>(&self, script: &str, parameter: P) -> Result<ScriptOutcome> {
        let text = format!("run({}(), {})", script, parameter);
        log::info!("Script command: {}", text);

        let id = self.send_command(TYPE_SCRIPT, text.as_bytes())?;

        let ack_code = self.await_acknowledge(id, self.ack_timeout)?;
        if ack_code != STATUS_SUCCESSFUL {
            log::warn!("Script command id={} rejected with code {}", id, ack_code);
            return Ok(ScriptOutcome::Rejected { code: ack_code });
        }

        let completion_code = self.await_completion(self.completion_timeout)?;
        if completion_code == STATUS_ABORTED || completion_code == STATUS_EXCEPTION {
            log::warn!(
                "Script command id={} failed with completion code {}",
                id,
                completion_code
            );
            return Ok(ScriptOutcome::Failed {
                code: completion_code,
            });
        }

        log::info!("Script command id={} completed", id);
        Ok(ScriptOutcome::Completed)
    }

    // === High-level wrappers (string formatting only) ===

    /// Rotate the inner stage by `degrees`
    pub fn rotate_inner(&self, degrees: i32) -> Result<ScriptOutcome> {
        self.run_script("inner_rotation_script", degrees)
    }

    /// Rotate the outer stage by `degrees`
    pub fn rotate_outer(&self, degrees: i32) -> Result<ScriptOutcome> {
        self.run_script("outer_rotation_script", degrees)
    }

    /// Drive all axes to their home positions
    pub fn home_all(&self) -> Result<ScriptOutcome> {
        self.run_script("home_all_axes_script", 0)
    }

    /// Announce this host's machine id (fire-and-forget IDENTITY frame)
    pub fn announce_identity(&self, machine_id: u32) -> Result<u32> {
        self.send_command(TYPE_IDENTITY, &machine_id.to_be_bytes())
    }

    /// Send a free-form CONTROL frame
    pub fn send_control(&self, text: &str) -> Result<u32> {
        self.send_command(TYPE_CONTROL, text.as_bytes())
    }
}
