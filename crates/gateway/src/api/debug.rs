//! `GET`/`PATCH /api/debug/settings` (§6.1): runtime-tunable, non-secret
//! process-wide defaults — the event dice tunables and the default
//! tick-label/post-gen-delay applied to newly created sessions.

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::service::{DebugSettingsPatch, SimulationService};
use crate::state::AppState;

pub async fn get(State(state): State<AppState>) -> impl IntoResponse {
    let svc = SimulationService::new(&state);
    Json(svc.debug_settings())
}

pub async fn patch(
    State(state): State<AppState>,
    Json(body): Json<DebugSettingsPatch>,
) -> impl IntoResponse {
    let svc = SimulationService::new(&state);
    Json(svc.patch_debug_settings(body))
}
