//! YantraLink - binary protocol engine for a rotation-stage controller
//!
//! This library speaks the controller's point-to-point frame protocol over a
//! persistent TCP byte stream: it reassembles inbound bytes into typed
//! frames, routes them into a latest-value telemetry store, and correlates
//! outbound commands with their acknowledgment and completion responses.
//!
//! ```no_run
//! use yantra_link::{AppConfig, YantraLink};
//!
//! # fn main() -> yantra_link::Result<()> {
//! let config = AppConfig::defaults();
//! let link = YantraLink::connect(&config)?;
//!
//! let outcome = link.commander().rotate_inner(45)?;
//! if outcome.is_success() {
//!     println!("Rotation complete");
//! }
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod link;
pub mod protocol;
pub mod telemetry;
pub mod transport;

// Re-export commonly used types
pub use command::{Commander, ScriptOutcome};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use link::YantraLink;
