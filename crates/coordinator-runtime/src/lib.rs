//! # Coordinator Runtime
//!
//! The long-lived coordinator context of the Crosslink platform.
//!
//! ## Startup Sequence
//!
//! 1. Wire shared infrastructure (in-memory host, handler registry,
//!    readiness gate, surface tracker)
//! 2. Register builtin diagnostics handlers
//! 3. Install the one-shot listener
//! 4. Spawn the channel acceptor
//! 5. Flip the readiness gate exactly once
//!
//! Requests that arrive between step 4 and step 5 are held by the
//! acceptor's bounded readiness poll instead of being rejected.

pub mod config;
pub mod handlers;
pub mod surfaces;

pub use config::CoordinatorConfig;
pub use handlers::{register_builtin_handlers, CoordinatorState};
pub use surfaces::{SurfaceEvent, SurfaceTracker};

use anyhow::{Context, Result};
use shared_messaging::adapters::{DispatchResponder, InMemoryHost};
use shared_messaging::ports::outbound::IncomingChannel;
use shared_messaging::{ChannelAcceptor, HandlerRegistry, Messenger, ReadinessGate};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tracing::info;

/// The coordinator runtime orchestrating the messaging fabric.
pub struct CoordinatorRuntime {
    config: CoordinatorConfig,
    host: Arc<InMemoryHost>,
    registry: Arc<HandlerRegistry>,
    readiness: Arc<ReadinessGate>,
    surfaces: Arc<SurfaceTracker>,
    state: Arc<CoordinatorState>,
    /// Listener feed, taken by `start`.
    incoming: Mutex<Option<mpsc::UnboundedReceiver<IncomingChannel>>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl CoordinatorRuntime {
    /// Wire a runtime. Nothing is served until [`start`](Self::start).
    #[must_use]
    pub fn new(config: CoordinatorConfig) -> Self {
        let (host, incoming) = InMemoryHost::new();
        let registry = Arc::new(HandlerRegistry::new());
        let readiness = Arc::new(ReadinessGate::new());
        let surfaces = Arc::new(SurfaceTracker::new());
        let state = Arc::new(CoordinatorState::new(surfaces.clone()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            host,
            registry,
            readiness,
            surfaces,
            state,
            incoming: Mutex::new(Some(incoming)),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Start serving: register builtin handlers, install the one-shot
    /// listener, spawn the acceptor, flip the readiness gate.
    pub async fn start(&self) -> Result<()> {
        info!("starting coordinator runtime");

        register_builtin_handlers(&self.registry, self.state.clone());

        self.host
            .set_one_shot_responder(Arc::new(DispatchResponder::new(self.registry.clone())));

        let incoming = self
            .incoming
            .lock()
            .map_err(|_| anyhow::anyhow!("listener feed lock poisoned"))?
            .take()
            .context("coordinator runtime already started")?;

        let acceptor = Arc::new(
            ChannelAcceptor::new(
                self.registry.clone(),
                self.readiness.clone(),
                self.surfaces.clone(),
            )
            .with_ready_bounds(self.config.ready_max_wait, self.config.ready_poll_interval),
        );
        tokio::spawn(acceptor.run(incoming));

        // Setup complete; from here on the acceptor serves immediately.
        self.readiness.mark_ready();
        info!("coordinator runtime ready");
        Ok(())
    }

    /// The coordinator's handler registry, for feature-module registration.
    #[must_use]
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// The surface tracker.
    #[must_use]
    pub fn surfaces(&self) -> &Arc<SurfaceTracker> {
        &self.surfaces
    }

    /// The in-memory host, for wiring additional contexts in loopback mode.
    #[must_use]
    pub fn host(&self) -> &Arc<InMemoryHost> {
        &self.host
    }

    /// Build a messenger for a client context sharing this host. Each
    /// client context gets its own (empty) handler registry.
    #[must_use]
    pub fn client_messenger(&self) -> Messenger {
        Messenger::new(
            self.host.clone(),
            self.host.clone(),
            Arc::new(HandlerRegistry::new()),
        )
    }

    /// Signal shutdown to anything waiting on [`wait_for_shutdown`](Self::wait_for_shutdown).
    pub fn shutdown(&self) {
        info!("coordinator runtime shutting down");
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait until [`shutdown`](Self::shutdown) is called.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.shutdown_rx.clone();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
