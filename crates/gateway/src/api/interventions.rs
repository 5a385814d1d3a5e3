//! `POST /api/intervention/{id}` (§6.1): enqueue a user intervention on a
//! session's branch, consumed by the next Runner round (§4.5 step 2).

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::error_response::AppResult;
use crate::service::SimulationService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InterventionBody {
    pub branch_id: String,
    pub content: String,
}

pub async fn enqueue(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<InterventionBody>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let intervention = svc
        .enqueue_intervention(&session_id, &body.branch_id, &body.content)
        .await?;
    Ok(Json(intervention))
}
