//! Structured logging using **tracing**.
//!
//! The library only emits events (`debug!` for individual removals, `info!`
//! per module, `warn!` when a module is returned unshaken). Binaries pick a
//! subscriber; [`init_structured_logging`] is the JSON one used by the CLI.

use tracing::{error, info, warn};

/// Initializes the global tracing collector (subscriber).
///
/// Call once at startup. Writes JSON lines to stderr so stdout stays free
/// for summaries and printed modules.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=jsshake_core=debug`)
pub fn init_structured_logging() {
    tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Logs a named event at the level its name implies.
pub fn log_event(event: &str, detail: &str) {
    match event.to_uppercase().as_str() {
        "ERROR" => error!(event = %event, detail = %detail),
        "WARN" | "WARNING" => warn!(event = %event, detail = %detail),
        _ => info!(event = %event, detail = %detail),
    }
}
