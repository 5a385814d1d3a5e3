//! Timeline read + message mutation endpoints (§6.1).

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::error_response::AppResult;
use crate::service::SimulationService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub branch_id: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub before_seq: Option<i64>,
}

fn default_limit() -> i64 {
    50
}

pub async fn get_timeline(
    State(state): State<AppState>,
    Path(_session_id): Path<String>,
    Query(query): Query<TimelineQuery>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let messages = svc
        .timeline(&query.branch_id, query.limit, query.before_seq)
        .await?;
    Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
pub struct DeleteLastQuery {
    pub branch_id: String,
}

pub async fn delete_last_message(
    State(state): State<AppState>,
    Path(_session_id): Path<String>,
    Query(query): Query<DeleteLastQuery>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let deleted = svc.delete_last_message(&query.branch_id).await?;
    Ok(Json(deleted))
}

/// Replaces `content` and/or `report_snapshot` (§4.1) — an omitted field
/// is left unchanged, not cleared.
#[derive(Debug, Default, Deserialize)]
pub struct EditMessageBody {
    pub content: Option<String>,
    pub report_snapshot: Option<serde_json::Value>,
}

pub async fn edit_message(
    State(state): State<AppState>,
    Path((_session_id, message_id)): Path<(String, String)>,
    Json(body): Json<EditMessageBody>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let message = svc
        .edit_message(&message_id, body.content.as_deref(), body.report_snapshot.as_ref())
        .await?;
    Ok(Json(message))
}
