//! YantraLink daemon - connects to the stage controller and echoes device
//! messages to the log until interrupted

use std::env;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use yantra_link::telemetry::{category, field};
use yantra_link::{AppConfig, Error, Result, YantraLink};

/// Parse config path from command line arguments.
///
/// Supports:
/// - `yantra-link <path>` (positional)
/// - `yantra-link --config <path>` (flag-based)
/// - `yantra-link -c <path>` (short flag)
///
/// Defaults to `/etc/yantralink.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "/etc/yantralink.toml".to_string()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("YantraLink v0.1.0 starting...");

    let config_path = parse_config_path();
    let config = if Path::new(&config_path).exists() {
        log::info!("Using config: {}", config_path);
        AppConfig::from_file(&config_path)?
    } else {
        log::warn!("Config {} not found, using defaults", config_path);
        AppConfig::defaults()
    };

    let mut link = YantraLink::connect(&config)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    log::info!("YantraLink running. Press Ctrl-C to stop.");

    // Echo device messages as they change; all decoding happens on the
    // reader thread
    let mut last_message: Option<String> = None;
    while running.load(Ordering::Relaxed) {
        let message = link.telemetry().get_text(category::MESSAGE, field::MESSAGE);
        if message.is_some() && message != last_message {
            let level = link
                .telemetry()
                .get_u32(category::MESSAGE, field::LEVEL)
                .unwrap_or(0);
            if let Some(ref text) = message {
                log::info!("Device message (level {}): {}", level, text);
            }
            last_message = message;
        }
        thread::sleep(Duration::from_millis(250));
    }

    log::info!("Shutting down...");
    link.shutdown();

    log::info!("YantraLink stopped");
    Ok(())
}
