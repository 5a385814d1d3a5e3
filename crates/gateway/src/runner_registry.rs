//! In-memory registry of live `ws-runner` tasks, one per `running`
//! session. Grounded on the teacher's `NodeRegistry`
//! (`crates/gateway/src/nodes/registry.rs`): a `parking_lot::RwLock<HashMap>`
//! guarding cheap-to-clone handles, with spawn-on-demand rather than
//! spawning every session's Runner eagerly at startup.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use ws_domain::config::EventDiceConfig;
use ws_eventbus::EventBus;
use ws_memory::MemoryCollaborator;
use ws_runner::RunnerHandle;
use ws_store::Store;

#[derive(Default)]
pub struct RunnerRegistry {
    handles: RwLock<HashMap<String, RunnerHandle>>,
}

impl RunnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session's live `RunnerHandle`, spawning a fresh task if
    /// none is registered yet. Idempotent: a session already running just
    /// gets its existing handle back.
    pub fn get_or_spawn(
        &self,
        session_id: &str,
        store: &Store,
        bus: &EventBus,
        memory: &Arc<dyn MemoryCollaborator>,
        event_dice: &EventDiceConfig,
    ) -> RunnerHandle {
        if let Some(handle) = self.handles.read().get(session_id) {
            return handle.clone();
        }
        let mut handles = self.handles.write();
        if let Some(handle) = handles.get(session_id) {
            return handle.clone();
        }
        let handle = RunnerHandle::spawn(
            session_id.to_string(),
            store.clone(),
            bus.clone(),
            memory.clone(),
            event_dice.clone(),
        );
        handles.insert(session_id.to_string(), handle.clone());
        handle
    }

    pub fn get(&self, session_id: &str) -> Option<RunnerHandle> {
        self.handles.read().get(session_id).cloned()
    }

    /// Drops the registry's reference to a stopped session's handle. The
    /// task itself exits on its own once `Stop` is processed (§4.5); this
    /// just stops the registry from handing out a dead handle.
    pub fn remove(&self, session_id: &str) {
        self.handles.write().remove(session_id);
    }
}
