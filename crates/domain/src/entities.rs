//! Core domain entities (§3): Session, Branch, TimelineMessage,
//! UserIntervention, ProviderConfig.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineStepUnit {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub world_preset: String,
    pub running: bool,
    pub tick_label: String,
    pub post_gen_delay_sec: u32,
    pub active_branch_id: String,
    pub output_language: String,
    pub timeline_start_iso: String,
    pub timeline_step_value: u32,
    pub timeline_step_unit: TimelineStepUnit,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Branch
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    pub session_id: String,
    pub name: String,
    pub parent_branch_id: Option<String>,
    pub fork_from_message_id: Option<String>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TimelineMessage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    SystemReport,
    UserIntervention,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineMessage {
    pub id: String,
    pub session_id: String,
    pub branch_id: String,
    pub seq: i64,
    pub role: MessageRole,
    pub content: String,
    pub time_jump_label: Option<String>,
    pub model_provider: Option<String>,
    pub model_name: Option<String>,
    pub token_in: Option<i64>,
    pub token_out: Option<i64>,
    pub is_user_edited: bool,
    /// Structured report object parsed from `content` when it is valid JSON
    /// matching the output schema in spec §4.3; `None` on parse failure.
    pub report_snapshot: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UserIntervention
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionStatus {
    Pending,
    Consumed,
    Canceled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIntervention {
    pub id: String,
    pub session_id: String,
    pub branch_id: String,
    pub content: String,
    pub status: InterventionStatus,
    pub created_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ProviderConfig
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Openai,
    Deepseek,
    Ollama,
    Gemini,
    Mock,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Openai => "openai",
            ProviderKind::Deepseek => "deepseek",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Mock => "mock",
        }
    }
}

/// The persisted row. `api_key_encrypted` is ciphertext only (I5) — never
/// deserialize this directly into an API response; use [`ProviderConfigView`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub session_id: String,
    pub provider: ProviderKind,
    pub base_url: String,
    pub api_key_encrypted: Vec<u8>,
    pub model_name: Option<String>,
    pub extra_json: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

/// Client-safe view of a [`ProviderConfig`] — reports only whether a key is
/// configured (§4.1 `upsert_provider_config`, §6.1 `GET /api/provider/{id}/current`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfigView {
    pub provider: ProviderKind,
    pub base_url: String,
    pub model_name: Option<String>,
    pub has_api_key: bool,
}

impl From<&ProviderConfig> for ProviderConfigView {
    fn from(cfg: &ProviderConfig) -> Self {
        Self {
            provider: cfg.provider,
            base_url: cfg.base_url.clone(),
            model_name: cfg.model_name.clone(),
            has_api_key: !cfg.api_key_encrypted.is_empty(),
        }
    }
}
