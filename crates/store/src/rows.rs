//! Row types mirroring the SQLite schema (§3) and their conversion into
//! the domain entities used everywhere else. Timestamps are stored as
//! RFC3339 text and booleans as `0`/`1` integers, matching the teacher's
//! `SessionRow`/`MessageRow` convention in spirit (plain SQL types at the
//! storage boundary, typed domain structs above it).

use chrono::{DateTime, Utc};
use ws_domain::entities::{
    Branch, InterventionStatus, MessageRole, ProviderConfig, ProviderKind, Session,
    TimelineMessage, TimelineStepUnit, UserIntervention,
};
use ws_domain::{Error, Result};

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Other(format!("corrupt timestamp in store: {e}")))
}

#[derive(sqlx::FromRow)]
pub struct SessionRow {
    pub id: String,
    pub title: String,
    pub world_preset: String,
    pub running: i64,
    pub tick_label: String,
    pub post_gen_delay_sec: i64,
    pub active_branch_id: String,
    pub output_language: String,
    pub timeline_start_iso: String,
    pub timeline_step_value: i64,
    pub timeline_step_unit: String,
    pub created_at: String,
    pub updated_at: String,
}

impl SessionRow {
    pub fn into_domain(self) -> Result<Session> {
        let timeline_step_unit = match self.timeline_step_unit.as_str() {
            "day" => TimelineStepUnit::Day,
            "week" => TimelineStepUnit::Week,
            "month" => TimelineStepUnit::Month,
            "year" => TimelineStepUnit::Year,
            other => return Err(Error::Other(format!("corrupt timeline_step_unit: {other}"))),
        };
        Ok(Session {
            id: self.id,
            title: self.title,
            world_preset: self.world_preset,
            running: self.running != 0,
            tick_label: self.tick_label,
            post_gen_delay_sec: self.post_gen_delay_sec as u32,
            active_branch_id: self.active_branch_id,
            output_language: self.output_language,
            timeline_start_iso: self.timeline_start_iso,
            timeline_step_value: self.timeline_step_value as u32,
            timeline_step_unit,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct BranchRow {
    pub id: String,
    pub session_id: String,
    pub name: String,
    pub parent_branch_id: Option<String>,
    pub fork_from_message_id: Option<String>,
    pub is_archived: i64,
    pub created_at: String,
}

impl BranchRow {
    pub fn into_domain(self) -> Result<Branch> {
        Ok(Branch {
            id: self.id,
            session_id: self.session_id,
            name: self.name,
            parent_branch_id: self.parent_branch_id,
            fork_from_message_id: self.fork_from_message_id,
            is_archived: self.is_archived != 0,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct TimelineMessageRow {
    pub id: String,
    pub session_id: String,
    pub branch_id: String,
    pub seq: i64,
    pub role: String,
    pub content: String,
    pub time_jump_label: Option<String>,
    pub model_provider: Option<String>,
    pub model_name: Option<String>,
    pub token_in: Option<i64>,
    pub token_out: Option<i64>,
    pub is_user_edited: i64,
    pub report_snapshot: Option<String>,
    pub created_at: String,
}

impl TimelineMessageRow {
    pub fn into_domain(self) -> Result<TimelineMessage> {
        let role = match self.role.as_str() {
            "system_report" => MessageRole::SystemReport,
            "user_intervention" => MessageRole::UserIntervention,
            other => return Err(Error::Other(format!("corrupt message role: {other}"))),
        };
        let report_snapshot = self
            .report_snapshot
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(Error::from)?;
        Ok(TimelineMessage {
            id: self.id,
            session_id: self.session_id,
            branch_id: self.branch_id,
            seq: self.seq,
            role,
            content: self.content,
            time_jump_label: self.time_jump_label,
            model_provider: self.model_provider,
            model_name: self.model_name,
            token_in: self.token_in,
            token_out: self.token_out,
            is_user_edited: self.is_user_edited != 0,
            report_snapshot,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct UserInterventionRow {
    pub id: String,
    pub session_id: String,
    pub branch_id: String,
    pub content: String,
    pub status: String,
    pub created_at: String,
    pub consumed_at: Option<String>,
}

impl UserInterventionRow {
    pub fn into_domain(self) -> Result<UserIntervention> {
        let status = match self.status.as_str() {
            "pending" => InterventionStatus::Pending,
            "consumed" => InterventionStatus::Consumed,
            "canceled" => InterventionStatus::Canceled,
            other => return Err(Error::Other(format!("corrupt intervention status: {other}"))),
        };
        Ok(UserIntervention {
            id: self.id,
            session_id: self.session_id,
            branch_id: self.branch_id,
            content: self.content,
            status,
            created_at: parse_ts(&self.created_at)?,
            consumed_at: self.consumed_at.as_deref().map(parse_ts).transpose()?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct ProviderConfigRow {
    pub session_id: String,
    pub provider: String,
    pub base_url: String,
    pub api_key_encrypted: Vec<u8>,
    pub model_name: Option<String>,
    pub extra_json: Option<String>,
    pub updated_at: String,
}

impl ProviderConfigRow {
    pub fn into_domain(self) -> Result<ProviderConfig> {
        let provider = match self.provider.as_str() {
            "openai" => ProviderKind::Openai,
            "deepseek" => ProviderKind::Deepseek,
            "ollama" => ProviderKind::Ollama,
            "gemini" => ProviderKind::Gemini,
            "mock" => ProviderKind::Mock,
            other => return Err(Error::Other(format!("corrupt provider kind: {other}"))),
        };
        let extra_json = self
            .extra_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(Error::from)?;
        Ok(ProviderConfig {
            session_id: self.session_id,
            provider,
            base_url: self.base_url,
            api_key_encrypted: self.api_key_encrypted,
            model_name: self.model_name,
            extra_json,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}
