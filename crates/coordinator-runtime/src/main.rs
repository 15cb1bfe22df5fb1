//! Coordinator entry point.
//!
//! Runs the coordinator runtime in loopback mode: telemetry up, acceptor
//! serving, readiness flipped, then wait for ctrl-c.

use anyhow::Result;
use coordinator_runtime::{CoordinatorConfig, CoordinatorRuntime};
use crosslink_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry_config = TelemetryConfig::from_env();
    let _telemetry = init_telemetry(&telemetry_config)?;

    info!("===========================================");
    info!("  Crosslink Coordinator v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let runtime = CoordinatorRuntime::new(CoordinatorConfig::from_env());
    runtime.start().await?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                error!(error = %err, "failed to listen for shutdown signal");
            } else {
                info!("ctrl-c received");
            }
        }
        () = runtime.wait_for_shutdown() => {}
    }

    runtime.shutdown();
    Ok(())
}
