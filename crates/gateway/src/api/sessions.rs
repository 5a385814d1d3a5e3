//! Session lifecycle endpoints (§6.1): create, detail, history,
//! start/pause/resume, settings.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use ws_domain::entities::TimelineStepUnit;

use crate::error_response::AppResult;
use crate::service::SimulationService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionBody {
    pub title: String,
    pub world_preset: String,
    #[serde(default = "default_start_iso")]
    pub timeline_start_iso: String,
    #[serde(default = "default_step_value")]
    pub timeline_step_value: u32,
    #[serde(default = "default_step_unit")]
    pub timeline_step_unit: TimelineStepUnit,
}

fn default_start_iso() -> String {
    "0001-01-01T00:00:00Z".to_string()
}

fn default_step_value() -> u32 {
    1
}

fn default_step_unit() -> TimelineStepUnit {
    TimelineStepUnit::Month
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionBody>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let session = svc
        .create_session(
            &body.title,
            &body.world_preset,
            &body.timeline_start_iso,
            body.timeline_step_value,
            body.timeline_step_unit,
        )
        .await?;
    Ok(Json(serde_json::json!({
        "session_id": session.id,
        "active_branch_id": session.active_branch_id,
        "running": session.running,
        "timeline_start_iso": session.timeline_start_iso,
        "timeline_step_value": session.timeline_step_value,
        "timeline_step_unit": session.timeline_step_unit,
    })))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let session = svc.get_session(&session_id).await?;
    Ok(Json(session))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

fn default_history_limit() -> i64 {
    50
}

pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let sessions = svc.list_history(query.limit).await?;
    Ok(Json(sessions))
}

pub async fn start(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let running = svc.start(&session_id).await?;
    Ok(Json(serde_json::json!({ "running": running })))
}

pub async fn pause(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let running = svc.pause(&session_id).await?;
    Ok(Json(serde_json::json!({ "running": running })))
}

pub async fn resume(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let running = svc.resume(&session_id).await?;
    Ok(Json(serde_json::json!({ "running": running })))
}

pub async fn stop(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let running = svc.stop(&session_id).await?;
    Ok(Json(serde_json::json!({ "running": running })))
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsPatchBody {
    pub tick_label: Option<String>,
    pub post_gen_delay_sec: Option<u32>,
    pub output_language: Option<String>,
    pub timeline_start_iso: Option<String>,
    pub timeline_step_value: Option<u32>,
    pub timeline_step_unit: Option<TimelineStepUnit>,
}

pub async fn update_settings(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<SettingsPatchBody>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let patch = ws_store::SessionSettingsPatch {
        tick_label: body.tick_label,
        post_gen_delay_sec: body.post_gen_delay_sec,
        output_language: body.output_language,
        timeline_start_iso: body.timeline_start_iso,
        timeline_step_value: body.timeline_step_value,
        timeline_step_unit: body.timeline_step_unit,
    };
    let session = svc.update_settings(&session_id, &patch).await?;
    Ok(Json(session))
}
