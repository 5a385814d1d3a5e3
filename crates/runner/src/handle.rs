//! The per-session Runner task (§4.5) and the handle used to command it.
//!
//! Shape grounded on the teacher's `SessionLockMap` (exclusivity primitive)
//! and `ScheduleRunner` (`tokio::spawn`ed task owning state, driven by a
//! command/tick loop) in `crates/gateway/src/runtime/`; the teacher has no
//! long-running generation loop of its own; retry/backoff is a small local
//! helper rather than a borrowed crate, matching the teacher's preference
//! for hand-rolled control flow over a retry dependency.

use std::sync::Arc;

use tokio::sync::mpsc;
use ws_domain::config::EventDiceConfig;
use ws_domain::event::Event;
use ws_domain::{Error, Result};
use ws_eventbus::EventBus;
use ws_memory::MemoryCollaborator;
use ws_store::Store;

use crate::command::RunnerCommand;
use crate::round::{run_round, RoundContext};
use crate::state::RunnerState;

const COMMAND_CHANNEL_CAPACITY: usize = 8;

/// A live handle to a session's Runner task. Cloning is cheap; every clone
/// commands the same task.
#[derive(Clone)]
pub struct RunnerHandle {
    tx: mpsc::Sender<RunnerCommand>,
}

impl RunnerHandle {
    /// Spawn the Runner task for `session_id`. The task runs until a `Stop`
    /// command is processed or every `RunnerHandle` clone (and the
    /// background task's own sender) is dropped.
    pub fn spawn(
        session_id: String,
        store: Store,
        bus: EventBus,
        memory: Arc<dyn MemoryCollaborator>,
        event_dice: EventDiceConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        tokio::spawn(run_session(session_id, store, bus, memory, event_dice, rx));
        Self { tx }
    }

    async fn send(&self, cmd: RunnerCommand) -> Result<()> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| Error::Conflict("runner task is no longer active".into()))
    }

    pub async fn start(&self) -> Result<()> {
        self.send(RunnerCommand::Start).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(RunnerCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(RunnerCommand::Resume).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(RunnerCommand::Stop).await
    }
}

async fn run_session(
    session_id: String,
    store: Store,
    bus: EventBus,
    memory: Arc<dyn MemoryCollaborator>,
    event_dice: EventDiceConfig,
    mut rx: mpsc::Receiver<RunnerCommand>,
) {
    let mut state = RunnerState::Idle;

    'outer: loop {
        state = match state {
            RunnerState::Idle | RunnerState::Paused => {
                match rx.recv().await {
                    Some(RunnerCommand::Start) | Some(RunnerCommand::Resume) => {
                        bus.publish(&session_id, Event::SessionState { running: true });
                        RunnerState::Running
                    }
                    Some(RunnerCommand::Stop) => RunnerState::Stopped,
                    Some(RunnerCommand::Pause) => state, // already not running: no-op
                    None => break 'outer,
                }
            }

            RunnerState::ErrorBackoff => match rx.recv().await {
                Some(RunnerCommand::Start) | Some(RunnerCommand::Resume) => {
                    bus.publish(&session_id, Event::SessionState { running: true });
                    RunnerState::Running
                }
                Some(RunnerCommand::Stop) => RunnerState::Stopped,
                Some(RunnerCommand::Pause) => state,
                None => break 'outer,
            },

            RunnerState::Running => {
                // Commands are only observed between rounds (§5 suspension points).
                match rx.try_recv() {
                    Ok(RunnerCommand::Pause) => {
                        bus.publish(&session_id, Event::SessionState { running: false });
                        RunnerState::Paused
                    }
                    Ok(RunnerCommand::Stop) => RunnerState::Stopped,
                    Ok(RunnerCommand::Start) | Ok(RunnerCommand::Resume) => RunnerState::Running,
                    Err(mpsc::error::TryRecvError::Empty) => {
                        let ctx = RoundContext {
                            store: &store,
                            bus: &bus,
                            memory: memory.as_ref(),
                            session_id: &session_id,
                            event_dice: &event_dice,
                        };
                        match run_round(&ctx).await {
                            Ok(()) => RunnerState::Running,
                            Err(e) => {
                                tracing::error!(session_id = %session_id, error = %e, "round failed, entering ERROR_BACKOFF");
                                bus.publish(
                                    &session_id,
                                    Event::Error { code: e.code().to_string(), message: e.to_string(), hint: None },
                                );
                                RunnerState::ErrorBackoff
                            }
                        }
                    }
                    Err(mpsc::error::TryRecvError::Disconnected) => RunnerState::Stopped,
                }
            }

            RunnerState::Stopped => break 'outer,
        };
    }

    let _ = store.set_running(&session_id, false).await;
    bus.publish(&session_id, Event::SessionState { running: false });
}
