//! Branch endpoints (§6.1): list + active branch, fork, switch.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::error_response::AppResult;
use crate::service::SimulationService;
use crate::state::AppState;

pub async fn get_branches(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let (branches, active_branch_id) = svc.list_branches(&session_id).await?;
    Ok(Json(serde_json::json!({
        "branches": branches,
        "active_branch_id": active_branch_id,
    })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ForkBody {
    pub cut_seq: Option<i64>,
    pub fork_from_message_id: Option<String>,
}

pub async fn fork(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
    Json(body): Json<ForkBody>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let branch = svc
        .fork_branch(&branch_id, body.cut_seq, body.fork_from_message_id.as_deref())
        .await?;
    Ok(Json(branch))
}

#[derive(Debug, Deserialize)]
pub struct SwitchBody {
    pub branch_id: String,
}

pub async fn switch(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<SwitchBody>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    svc.switch_branch(&session_id, &body.branch_id).await?;
    Ok(Json(serde_json::json!({ "active_branch_id": body.branch_id })))
}
