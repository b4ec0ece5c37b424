//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Log to stdout at the configured level
//! - Mirror debug-level events into a plain-text log file when configured
//!
//! `RUST_LOG` overrides the configured level for stdout.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::ObservabilityConfig;

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> std::io::Result<()> {
    let stdout_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));
    let stdout = fmt::layer().with_target(false).with_filter(stdout_filter);

    let file = match &config.log_file {
        Some(path) => {
            let path = Path::new(path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(EnvFilter::new(default_directive("debug"))),
            )
        }
        None => None,
    };

    // A second init (tests, embedding) keeps the first subscriber.
    if let Err(e) = tracing_subscriber::registry().with(stdout).with(file).try_init() {
        tracing::debug!(error = %e, "Global subscriber already installed, keeping it");
    }
    Ok(())
}

/// Filter directive scoping `level` to this crate, keeping dependencies at warn.
fn default_directive(level: &str) -> String {
    format!("warn,aptos_name_minter={}", level)
}
