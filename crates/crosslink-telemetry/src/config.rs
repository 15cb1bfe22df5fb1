//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to logs
    pub service_name: String,

    /// Context identifier (coordinator, page, popup, ...)
    pub context: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "crosslink".to_string(),
            context: "coordinator".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CROSSLINK_SERVICE_NAME`: Service name (default: crosslink)
    /// - `CROSSLINK_CONTEXT`: Context identifier (default: coordinator)
    /// - `CROSSLINK_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `CROSSLINK_JSON_LOGS`: JSON logs (default: false)
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("CROSSLINK_SERVICE_NAME")
                .unwrap_or_else(|_| "crosslink".to_string()),

            context: env::var("CROSSLINK_CONTEXT").unwrap_or_else(|_| "coordinator".to_string()),

            log_level: env::var("CROSSLINK_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("CROSSLINK_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Configuration for a specific context kind.
    #[must_use]
    pub fn for_context(context: &str) -> Self {
        let mut config = Self::from_env();
        config.context = context.to_string();
        config
    }

    /// The full service name including the context tag.
    #[must_use]
    pub fn full_service_name(&self) -> String {
        format!("{}-{}", self.service_name, self.context)
    }
}
