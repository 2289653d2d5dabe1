//! Configuration for the YantraLink daemon
//!
//! Loads configuration from a TOML file: device endpoint, protocol timing
//! budgets, and logging preferences.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub protocol: ProtocolConfig,
    pub logging: LoggingConfig,
}

/// Device endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// TCP address of the stage controller (e.g., "192.168.1.40:4660")
    pub address: String,
    /// Machine id announced in the IDENTITY frame after connect
    pub machine_id: u32,
}

/// Protocol timing budgets
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProtocolConfig {
    /// Budget for the device to acknowledge a command
    pub ack_timeout_ms: u64,
    /// Budget for a script to run to completion (rotations can take minutes)
    pub completion_timeout_ms: u64,
    /// Cadence of the correlator's store polls; bounds worst-case wake
    /// latency
    pub poll_interval_ms: u64,
}

impl ProtocolConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log output (stdout, stderr, or file path)
    pub output: String,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Default configuration, suitable for development against a local
    /// device simulator
    pub fn defaults() -> Self {
        Self {
            device: DeviceConfig {
                address: "127.0.0.1:4660".to_string(),
                machine_id: 1,
            },
            protocol: ProtocolConfig {
                ack_timeout_ms: 5_000,
                completion_timeout_ms: 120_000,
                poll_interval_ms: 250,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                output: "stdout".to_string(),
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::defaults();
        assert_eq!(config.device.address, "127.0.0.1:4660");
        assert_eq!(config.device.machine_id, 1);
        assert_eq!(config.protocol.poll_interval_ms, 250);
        assert_eq!(config.protocol.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::defaults();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[device]"));
        assert!(toml_string.contains("[protocol]"));
        assert!(toml_string.contains("[logging]"));
        assert!(toml_string.contains("ack_timeout_ms = 5000"));
        assert!(toml_string.contains("address = \"127.0.0.1:4660\""));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[device]
address = "10.0.0.5:4660"
machine_id = 7

[protocol]
ack_timeout_ms = 2000
completion_timeout_ms = 60000
poll_interval_ms = 100

[logging]
level = "debug"
output = "stderr"
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.device.address, "10.0.0.5:4660");
        assert_eq!(config.device.machine_id, 7);
        assert_eq!(config.protocol.ack_timeout_ms, 2000);
        assert_eq!(config.logging.level, "debug");
    }
}
