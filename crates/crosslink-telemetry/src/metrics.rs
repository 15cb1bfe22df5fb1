//! Prometheus metrics for the messaging fabric.
//!
//! All metrics follow the naming convention: `crosslink_<area>_<metric>_<unit>`.

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DELIVERY METRICS
    // =========================================================================

    /// Requests sent, by transport class
    pub static ref MESSAGES_SENT: CounterVec = CounterVec::new(
        Opts::new("crosslink_messaging_sent_total", "Requests sent by transport class"),
        &["class"]  // class: fast/slow
    ).expect("metric creation failed");

    /// One-shot attempts that were retried
    pub static ref MESSAGES_RETRIED: Counter = Counter::new(
        "crosslink_messaging_retries_total",
        "One-shot attempts retried after timeout or failure"
    ).expect("metric creation failed");

    /// Fallback channel sessions opened after a failed direct phase
    pub static ref FALLBACKS_OPENED: Counter = Counter::new(
        "crosslink_messaging_fallbacks_total",
        "Persistent-channel fallbacks after a failed one-shot phase"
    ).expect("metric creation failed");

    // =========================================================================
    // COORDINATOR METRICS
    // =========================================================================

    /// Channels accepted, by purpose
    pub static ref CHANNELS_ACCEPTED: CounterVec = CounterVec::new(
        Opts::new("crosslink_acceptor_channels_total", "Inbound channels accepted by purpose"),
        &["purpose"]
    ).expect("metric creation failed");

    /// Dispatches that produced a failure reply
    pub static ref DISPATCH_FAILURES: Counter = Counter::new(
        "crosslink_dispatch_failures_total",
        "Dispatches that produced a failure reply"
    ).expect("metric creation failed");

    /// Lifecycle channel disconnects observed
    pub static ref LIFECYCLE_DISCONNECTS: CounterVec = CounterVec::new(
        Opts::new("crosslink_lifecycle_disconnects_total", "Lifecycle channel disconnects by surface"),
        &["surface"]
    ).expect("metric creation failed");
}

/// Handle proving metrics were registered.
pub struct MetricsHandle {
    _registered: bool,
}

/// Register all metrics with the global registry. Idempotent per process:
/// a second registration of the same collector is reported as an error by
/// Prometheus and ignored here.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(MESSAGES_SENT.clone()),
        Box::new(MESSAGES_RETRIED.clone()),
        Box::new(FALLBACKS_OPENED.clone()),
        Box::new(CHANNELS_ACCEPTED.clone()),
        Box::new(DISPATCH_FAILURES.clone()),
        Box::new(LIFECYCLE_DISCONNECTS.clone()),
    ];

    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) => {}
            Err(prometheus::Error::AlreadyReg) => {}
            Err(err) => return Err(TelemetryError::MetricsInit(err.to_string())),
        }
    }

    Ok(MetricsHandle { _registered: true })
}

/// Encode the current metrics in the Prometheus text exposition format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&families, &mut buffer)
        .map_err(|err| TelemetryError::MetricsInit(err.to_string()))?;
    String::from_utf8(buffer).map_err(|err| TelemetryError::MetricsInit(err.to_string()))
}
