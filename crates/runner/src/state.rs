//! The Runner's state machine states (§4.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunnerState {
    Idle,
    Running,
    Paused,
    ErrorBackoff,
    Stopped,
}
