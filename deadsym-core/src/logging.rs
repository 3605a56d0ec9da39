//! Structured logging using **tracing**.
//!
//! - Events are emitted through tracing macros with structured fields
//! - The JSON subscriber writes to stderr so stdout stays clean for reports
//! - Filtering follows `RUST_LOG` (e.g. `RUST_LOG=deadsym_core=debug`)

use tracing::{error, info, warn};

/// Initializes the global tracing subscriber.
///
/// Intended to be called once at startup. A second call is a no-op rather
/// than a panic, so tests and embedders can call it freely.
pub fn init_structured_logging() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Logs a warning event.
pub fn log_warn(message: &str) {
    warn!(detail = %message);
}

/// Logs an info event.
pub fn log_info(message: &str) {
    info!(detail = %message);
}

/// Logs an error event.
pub fn log_error(message: &str) {
    error!(detail = %message);
}

/// Logs a custom event with a specific event name.
///
/// The level is picked from the event name: `ERROR`, `WARN`/`WARNING`,
/// anything else is info.
pub fn log_event(event: &str, detail: &str) {
    match event.to_uppercase().as_str() {
        "ERROR" => error!(event = %event, detail = %detail),
        "WARN" | "WARNING" => warn!(event = %event, detail = %detail),
        _ => info!(event = %event, detail = %detail),
    }
}
