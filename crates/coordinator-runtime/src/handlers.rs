//! # Builtin Handlers
//!
//! Diagnostics handlers the coordinator always serves, registered once at
//! startup. Feature modules register their own handlers on top of these;
//! re-registration is last-write-wins by design.

use crate::surfaces::SurfaceTracker;
use parking_lot::RwLock;
use serde_json::{json, Value};
use shared_messaging::{handler_fn, HandlerOutcome, HandlerRegistry};
use shared_types::Action;
use std::sync::Arc;
use std::time::Instant;

/// Mutable coordinator state visible to the diagnostics handlers.
pub struct CoordinatorState {
    started_at: Instant,
    settings: RwLock<Value>,
    surfaces: Arc<SurfaceTracker>,
}

impl CoordinatorState {
    /// Fresh state with empty settings.
    #[must_use]
    pub fn new(surfaces: Arc<SurfaceTracker>) -> Self {
        Self {
            started_at: Instant::now(),
            settings: RwLock::new(json!({})),
            surfaces,
        }
    }

    /// Current settings snapshot.
    #[must_use]
    pub fn settings(&self) -> Value {
        self.settings.read().clone()
    }
}

/// Register the builtin diagnostics handlers.
pub fn register_builtin_handlers(registry: &HandlerRegistry, state: Arc<CoordinatorState>) {
    registry.register(
        Action::Ping,
        handler_fn(|_, _| HandlerOutcome::ok(json!({"message": "pong"}))),
    );

    let get_state = state.clone();
    registry.register(
        Action::GetState,
        handler_fn(move |_, _| {
            HandlerOutcome::ok(json!({
                "context": "coordinator",
                "uptimeMs": get_state.started_at.elapsed().as_millis() as u64,
                "openSurfaces": get_state.surfaces.open_surfaces(),
                "settings": get_state.settings(),
            }))
        }),
    );

    let update_settings = state;
    registry.register(
        Action::UpdateSettings,
        handler_fn(move |envelope, _| {
            let patch = envelope.payload.clone();
            let Some(patch) = patch.as_object() else {
                return HandlerOutcome::err("settings payload must be an object");
            };
            let mut settings = update_settings.settings.write();
            if !settings.is_object() {
                *settings = json!({});
            }
            if let Some(current) = settings.as_object_mut() {
                for (key, value) in patch {
                    current.insert(key.clone(), value.clone());
                }
            }
            HandlerOutcome::ok(json!({"updated": patch.len()}))
        }),
    );
}
