//! # Surface Tracker
//!
//! Records which UI surfaces currently hold an open lifecycle channel and
//! broadcasts open/close events. The close event is how long-running
//! background activity tied to a surface (speech synthesis, capture jobs)
//! learns it should stop: feature modules subscribe to the event stream and
//! react to `Closed` for their surface.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_messaging::LifecycleObserver;
use std::collections::BTreeSet;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info};

/// Capacity of the surface event channel before slow subscribers lag.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A surface lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// A surface's lifecycle channel connected.
    Opened(String),
    /// A surface's lifecycle channel disconnected. Background activity for
    /// this surface should stop.
    Closed(String),
}

/// Tracks open UI surfaces via their lifecycle channels.
pub struct SurfaceTracker {
    open: RwLock<BTreeSet<String>>,
    events: broadcast::Sender<SurfaceEvent>,
}

impl Default for SurfaceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceTracker {
    /// Create a tracker with no open surfaces.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            open: RwLock::new(BTreeSet::new()),
            events,
        }
    }

    /// True while the surface's lifecycle channel is connected.
    #[must_use]
    pub fn is_open(&self, surface: &str) -> bool {
        self.open.read().contains(surface)
    }

    /// Names of all currently open surfaces.
    #[must_use]
    pub fn open_surfaces(&self) -> Vec<String> {
        self.open.read().iter().cloned().collect()
    }

    /// Subscribe to surface open/close events.
    #[must_use]
    pub fn events(&self) -> BroadcastStream<SurfaceEvent> {
        BroadcastStream::new(self.events.subscribe())
    }

    fn publish(&self, event: SurfaceEvent) {
        // No subscribers is fine; the tracker state is still authoritative.
        if self.events.send(event).is_err() {
            debug!("surface event dropped (no subscribers)");
        }
    }
}

#[async_trait]
impl LifecycleObserver for SurfaceTracker {
    async fn surface_opened(&self, surface: &str) {
        self.open.write().insert(surface.to_string());
        debug!(surface = %surface, "surface opened");
        self.publish(SurfaceEvent::Opened(surface.to_string()));
    }

    async fn surface_closed(&self, surface: &str) {
        self.open.write().remove(surface);
        info!(surface = %surface, "surface closed, stopping its background activity");
        self.publish(SurfaceEvent::Closed(surface.to_string()));
    }
}
