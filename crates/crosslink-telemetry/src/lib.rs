//! # Crosslink Telemetry
//!
//! Structured logging and Prometheus metrics for Crosslink contexts.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crosslink_telemetry::{TelemetryConfig, init_telemetry};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(&config).expect("telemetry init failed");
//!     // Logs and metrics are now being collected.
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CROSSLINK_SERVICE_NAME` | `crosslink` | Service name attached to logs |
//! | `CROSSLINK_LOG_LEVEL` | `info` | Log level filter |
//! | `CROSSLINK_JSON_LOGS` | `false` | JSON log output |

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    gather_metrics, register_metrics, MetricsHandle, CHANNELS_ACCEPTED, DISPATCH_FAILURES,
    FALLBACKS_OPENED, LIFECYCLE_DISCONNECTS, MESSAGES_RETRIED, MESSAGES_SENT,
};
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("failed to register Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application;
/// dropping it flushes pending output.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    let tracing_guard = tracing_setup::init_tracing(config)?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shut down.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("shutting down telemetry");
    }
}
