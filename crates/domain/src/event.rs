//! Typed events fanned out over the per-session Event Bus (§4.4).

use serde::{Deserialize, Serialize};

use crate::entities::TimelineMessage;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "session_state")]
    SessionState { running: bool },

    #[serde(rename = "message_created")]
    MessageCreated {
        branch_id: String,
        message: TimelineMessage,
    },

    #[serde(rename = "message_updated")]
    MessageUpdated {
        branch_id: String,
        message: TimelineMessage,
    },

    #[serde(rename = "branch_switched")]
    BranchSwitched { active_branch_id: String },

    #[serde(rename = "models_loaded")]
    ModelsLoaded {
        provider: String,
        models: Vec<String>,
    },

    #[serde(rename = "error")]
    Error {
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },
}
