//! Tracing subscriber setup.
//!
//! Configures structured logging with an env-filter and either pretty or
//! JSON output. Exporter wiring (OTLP and friends) is left to the embedding
//! application.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Guard returned by [`init_tracing`]. Held for symmetry with exporters
/// that need flushing on shutdown.
pub struct TracingGuard {
    _service_name: String,
}

/// Initialize the tracing subscriber.
///
/// A second initialization in the same process is tolerated: the existing
/// subscriber wins and a guard is still returned, which keeps test binaries
/// that initialize per-test from failing.
pub fn init_tracing(config: &TelemetryConfig) -> Result<TracingGuard, TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::TracingInit(e.to_string()))?;

    let initialized = if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
    };

    if initialized.is_ok() {
        tracing::info!(
            service = %config.full_service_name(),
            json_logs = config.json_logs,
            "tracing initialized"
        );
    }

    Ok(TracingGuard {
        _service_name: config.full_service_name(),
    })
}
