//! The Simulation Service (§4.6): the façade that owns request-driven
//! state mutation, sitting between the thin `api/*` handlers and the
//! Store/Runner/Provider layers. Grounded on the teacher's split between
//! `api/sessions.rs` (thin handler, deserializes + delegates) and
//! `runtime/agent.rs` (owns the actual mutation) — here collapsed into
//! one façade struct since this system has a single state-owning
//! component per session rather than the teacher's agent-manager
//! indirection.

use ws_domain::entities::{
    Branch, ProviderConfigView, ProviderKind, Session, TimelineMessage, TimelineStepUnit,
    UserIntervention,
};
use ws_domain::event::Event;
use ws_domain::{Error, Result};
use ws_store::{SessionSettingsPatch, SessionSummary, Store};

use crate::state::AppState;

pub struct SimulationService<'a> {
    state: &'a AppState,
}

impl<'a> SimulationService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn store(&self) -> &Store {
        &self.state.store
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_session(
        &self,
        title: &str,
        world_preset: &str,
        timeline_start_iso: &str,
        timeline_step_value: u32,
        timeline_step_unit: TimelineStepUnit,
    ) -> Result<Session> {
        let defaults = self.state.debug_settings.read().clone();
        self.store()
            .create_session(
                title,
                world_preset,
                &defaults.default_tick_label,
                defaults.default_post_gen_delay_sec,
                "en",
                timeline_start_iso,
                timeline_step_value,
                timeline_step_unit,
            )
            .await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session> {
        self.store().get_session(session_id).await
    }

    pub async fn list_history(&self, limit: i64) -> Result<Vec<SessionSummary>> {
        self.store().list_recent_sessions(limit).await
    }

    pub async fn update_settings(
        &self,
        session_id: &str,
        patch: &SessionSettingsPatch,
    ) -> Result<Session> {
        self.store().update_settings(session_id, patch).await
    }

    /// `POST /api/session/{id}/start` (§4.6: requires a provider configured
    /// with a selected model, else `PreconditionFailed`).
    pub async fn start(&self, session_id: &str) -> Result<bool> {
        let cfg = self
            .store()
            .get_provider_config(session_id)
            .await?
            .ok_or_else(|| Error::PreconditionFailed {
                code: "NO_PROVIDER_CONFIGURED".into(),
                message: "configure a provider before starting".into(),
            })?;
        if cfg.model_name.is_none() {
            return Err(Error::PreconditionFailed {
                code: "NO_MODEL_SELECTED".into(),
                message: "select a model before starting".into(),
            });
        }

        let event_dice = self.state.debug_settings.read().event_dice.clone();
        let handle = self.state.runners.get_or_spawn(
            session_id,
            self.store(),
            &self.state.bus,
            &self.state.memory,
            &event_dice,
        );
        handle.start().await?;
        self.store().set_running(session_id, true).await?;
        Ok(true)
    }

    pub async fn pause(&self, session_id: &str) -> Result<bool> {
        if let Some(handle) = self.state.runners.get(session_id) {
            handle.pause().await?;
        }
        self.store().set_running(session_id, false).await?;
        Ok(false)
    }

    pub async fn resume(&self, session_id: &str) -> Result<bool> {
        let event_dice = self.state.debug_settings.read().event_dice.clone();
        let handle = self.state.runners.get_or_spawn(
            session_id,
            self.store(),
            &self.state.bus,
            &self.state.memory,
            &event_dice,
        );
        handle.resume().await?;
        self.store().set_running(session_id, true).await?;
        Ok(true)
    }

    pub async fn stop(&self, session_id: &str) -> Result<bool> {
        if let Some(handle) = self.state.runners.get(session_id) {
            handle.stop().await?;
        }
        self.state.runners.remove(session_id);
        self.store().set_running(session_id, false).await?;
        Ok(false)
    }

    pub async fn list_branches(&self, session_id: &str) -> Result<(Vec<Branch>, String)> {
        let session = self.store().get_session(session_id).await?;
        let branches = self.store().list_branches(session_id).await?;
        Ok((branches, session.active_branch_id))
    }

    pub async fn fork_branch(
        &self,
        source_branch_id: &str,
        cut_seq: Option<i64>,
        fork_from_message_id: Option<&str>,
    ) -> Result<Branch> {
        let new_branch = self
            .store()
            .fork_branch(source_branch_id, cut_seq, fork_from_message_id)
            .await?;
        self.state.memory.on_fork(
            &new_branch.session_id,
            source_branch_id,
            &new_branch.id,
            cut_seq.unwrap_or(i64::MAX),
        ).await;
        Ok(new_branch)
    }

    pub async fn switch_branch(&self, session_id: &str, branch_id: &str) -> Result<()> {
        self.store().switch_branch(session_id, branch_id).await?;
        self.state.bus.publish(
            session_id,
            Event::BranchSwitched { active_branch_id: branch_id.to_string() },
        );
        Ok(())
    }

    pub async fn timeline(
        &self,
        branch_id: &str,
        limit: i64,
        before_seq: Option<i64>,
    ) -> Result<Vec<TimelineMessage>> {
        self.store().timeline_page(branch_id, limit, before_seq).await
    }

    /// `DELETE /api/message/{id}/last` (§6.1, §7: `Busy` -> HTTP 409).
    pub async fn delete_last_message(&self, branch_id: &str) -> Result<TimelineMessage> {
        let deleted = self.store().delete_last_message(branch_id).await?;
        self.state
            .memory
            .on_message_deleted(&deleted.session_id, branch_id, &deleted.id)
            .await;
        Ok(deleted)
    }

    pub async fn edit_message(
        &self,
        message_id: &str,
        content: Option<&str>,
        report_snapshot: Option<&serde_json::Value>,
    ) -> Result<TimelineMessage> {
        let message = self.store().edit_message(message_id, content, report_snapshot).await?;
        self.state.bus.publish(
            &message.session_id,
            Event::MessageUpdated { branch_id: message.branch_id.clone(), message: message.clone() },
        );
        Ok(message)
    }

    pub async fn enqueue_intervention(
        &self,
        session_id: &str,
        branch_id: &str,
        content: &str,
    ) -> Result<UserIntervention> {
        self.store()
            .enqueue_intervention(session_id, branch_id, content)
            .await
    }

    pub async fn provider_set(
        &self,
        session_id: &str,
        provider: ProviderKind,
        base_url: &str,
        api_key_plain: Option<&str>,
        model_name: Option<&str>,
    ) -> Result<ProviderConfigView> {
        self.store()
            .upsert_provider_config(session_id, provider, base_url, api_key_plain, model_name)
            .await
    }

    pub async fn provider_current(&self, session_id: &str) -> Result<Option<ProviderConfigView>> {
        Ok(self
            .store()
            .get_provider_config(session_id)
            .await?
            .map(|cfg| ProviderConfigView::from(&cfg)))
    }

    pub async fn provider_select_model(
        &self,
        session_id: &str,
        model_name: &str,
    ) -> Result<ProviderConfigView> {
        self.store().select_model(session_id, model_name).await
    }

    /// `GET /api/provider/{id}/models?provider=...` (§6.1). The `provider`
    /// query parameter must match the session's already-configured
    /// provider kind — this endpoint lists what the configured base
    /// URL/key can see, it does not probe arbitrary unconfigured providers.
    pub async fn provider_models(&self, session_id: &str, requested: ProviderKind) -> Result<Vec<String>> {
        let cfg = self
            .store()
            .get_provider_config(session_id)
            .await?
            .ok_or_else(|| Error::PreconditionFailed {
                code: "NO_PROVIDER_CONFIGURED".into(),
                message: "configure a provider before listing models".into(),
            })?;
        if cfg.provider != requested {
            return Err(Error::Validation(format!(
                "session is configured for {:?}, not {:?}",
                cfg.provider, requested
            )));
        }
        let api_key = self.store().decrypt_api_key(&cfg).await?;
        let adapter = ws_providers::build_provider(&cfg, &api_key)?;
        let models = adapter.list_models().await?;
        self.state.bus.publish(
            session_id,
            Event::ModelsLoaded { provider: adapter.provider_id().to_string(), models: models.clone() },
        );
        Ok(models)
    }

    pub fn debug_settings(&self) -> crate::state::DebugSettings {
        self.state.debug_settings.read().clone()
    }

    pub fn patch_debug_settings(&self, patch: DebugSettingsPatch) -> crate::state::DebugSettings {
        let mut guard = self.state.debug_settings.write();
        if let Some(enabled) = patch.event_dice_enabled {
            guard.event_dice.enabled = enabled;
        }
        if let Some(v) = patch.event_dice_min_events {
            guard.event_dice.min_events = v;
        }
        if let Some(v) = patch.event_dice_max_events {
            guard.event_dice.max_events = v;
        }
        if let Some(v) = patch.default_post_gen_delay_sec {
            guard.default_post_gen_delay_sec = v;
        }
        if let Some(v) = patch.default_tick_label.clone() {
            guard.default_tick_label = v;
        }
        guard.clone()
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct DebugSettingsPatch {
    pub event_dice_enabled: Option<bool>,
    pub event_dice_min_events: Option<u32>,
    pub event_dice_max_events: Option<u32>,
    pub default_post_gen_delay_sec: Option<u32>,
    pub default_tick_label: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;
    use ws_domain::entities::{ProviderKind, TimelineStepUnit};

    use super::*;
    use crate::runner_registry::RunnerRegistry;

    async fn test_state() -> AppState {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("worldline.db");
        std::mem::forget(dir);
        let url = format!("sqlite://{}", path.display());
        let store = Store::connect(&url, "test-app-secret-key").await.expect("connect");
        AppState {
            config: std::sync::Arc::new(ws_domain::config::Config::from_env()),
            store,
            bus: ws_eventbus::EventBus::new(),
            memory: std::sync::Arc::new(ws_memory::NullMemory),
            runners: std::sync::Arc::new(RunnerRegistry::new()),
            debug_settings: std::sync::Arc::new(parking_lot::RwLock::new(crate::state::DebugSettings {
                event_dice: ws_domain::config::EventDiceConfig::default(),
                default_post_gen_delay_sec: 0,
                default_tick_label: "Year 1".into(),
            })),
        }
    }

    async fn next_event(sub: &ws_eventbus::Subscription) -> Event {
        timeout(Duration::from_secs(5), sub.recv())
            .await
            .expect("event within timeout")
            .expect("event bus still open")
    }

    #[tokio::test]
    async fn start_pause_stop_lifecycle_emits_messages() {
        let state = test_state().await;
        let svc = SimulationService::new(&state);

        let session = svc
            .create_session("A Test World", "a rural valley", "0001-01-01T00:00:00Z", 1, TimelineStepUnit::Month)
            .await
            .unwrap();

        svc.provider_set(&session.id, ProviderKind::Mock, "http://mock.invalid", None, Some("fixture-v1"))
            .await
            .unwrap();

        let sub = state.bus.subscribe(&session.id);
        assert!(svc.start(&session.id).await.unwrap());

        loop {
            if matches!(next_event(&sub).await, Event::MessageCreated { .. }) {
                break;
            }
        }

        assert!(!svc.pause(&session.id).await.unwrap());
        assert!(!svc.stop(&session.id).await.unwrap());

        let reloaded = svc.get_session(&session.id).await.unwrap();
        assert!(!reloaded.running);
    }

    #[tokio::test]
    async fn start_without_provider_is_precondition_failed() {
        let state = test_state().await;
        let svc = SimulationService::new(&state);
        let session = svc
            .create_session("No Provider", "a city", "0001-01-01T00:00:00Z", 1, TimelineStepUnit::Month)
            .await
            .unwrap();

        let err = svc.start(&session.id).await.unwrap_err();
        assert!(matches!(err, Error::PreconditionFailed { .. }));
    }

    #[tokio::test]
    async fn fork_then_switch_publishes_branch_switched() {
        let state = test_state().await;
        let svc = SimulationService::new(&state);
        let session = svc
            .create_session("Forkable", "a rural valley", "0001-01-01T00:00:00Z", 1, TimelineStepUnit::Month)
            .await
            .unwrap();

        let (branches, active_id) = svc.list_branches(&session.id).await.unwrap();
        assert_eq!(branches.len(), 1);

        let fork = svc.fork_branch(&active_id, None, None).await.unwrap();
        assert_ne!(fork.id, active_id);

        let sub = state.bus.subscribe(&session.id);
        svc.switch_branch(&session.id, &fork.id).await.unwrap();
        match next_event(&sub).await {
            Event::BranchSwitched { active_branch_id } => assert_eq!(active_branch_id, fork.id),
            other => panic!("expected BranchSwitched, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn provider_models_rejects_mismatched_provider() {
        let state = test_state().await;
        let svc = SimulationService::new(&state);
        let session = svc
            .create_session("Mismatch", "a city", "0001-01-01T00:00:00Z", 1, TimelineStepUnit::Month)
            .await
            .unwrap();
        svc.provider_set(&session.id, ProviderKind::Mock, "http://mock.invalid", None, None)
            .await
            .unwrap();

        let err = svc.provider_models(&session.id, ProviderKind::Openai).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn debug_settings_patch_is_partial() {
        let state = test_state().await;
        let svc = SimulationService::new(&state);
        let before = svc.debug_settings();

        let after = svc.patch_debug_settings(DebugSettingsPatch {
            default_tick_label: Some("Epoch 2".into()),
            ..Default::default()
        });

        assert_eq!(after.default_tick_label, "Epoch 2");
        assert_eq!(after.default_post_gen_delay_sec, before.default_post_gen_delay_sec);
        assert_eq!(after.event_dice.enabled, before.event_dice.enabled);
    }
}
