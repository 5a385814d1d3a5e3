//! Shared application state passed to all API handlers.
//!
//! Fields are grouped by concern, following the teacher's `AppState`
//! grouping convention in `crates/gateway/src/state.rs` — scaled down to
//! the six components this system actually has (Store, Provider Adapters,
//! Prompt Builder, Event Bus, Runner, Simulation Service).

use std::sync::Arc;

use parking_lot::RwLock;
use ws_domain::config::{Config, EventDiceConfig};
use ws_eventbus::EventBus;
use ws_memory::MemoryCollaborator;
use ws_store::Store;

use crate::runner_registry::RunnerRegistry;

/// Runtime-tunable, non-secret subset of configuration (§6.1 `GET`/`PATCH
/// /api/debug/settings`). Changes apply to sessions started after the
/// change; a session whose Runner is already spawned keeps the
/// `EventDiceConfig` it was spawned with until it is next stopped and
/// restarted (see DESIGN.md).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DebugSettings {
    pub event_dice: EventDiceConfig,
    pub default_post_gen_delay_sec: u32,
    pub default_tick_label: String,
}

#[derive(Clone)]
pub struct AppState {
    // ── Core services ─────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub store: Store,
    pub bus: EventBus,
    pub memory: Arc<dyn MemoryCollaborator>,

    // ── Runner lifecycle ──────────────────────────────────────────────
    /// One Runner task per `running` session, spawned on demand.
    pub runners: Arc<RunnerRegistry>,

    // ── Runtime-tunable config (§6.1 debug/settings) ──────────────────
    pub debug_settings: Arc<RwLock<DebugSettings>>,
}
