pub mod branches;
pub mod debug;
pub mod health;
pub mod interventions;
pub mod providers;
pub mod sessions;
pub mod timeline;
pub mod ws;

use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router (§6.1, §6.2, §6.6). Unlike the teacher's
/// gateway there is no bearer-token auth surface here — SPEC_FULL.md's
/// ambient-stack section does not carry the teacher's `SA_API_TOKEN`
/// middleware forward, since nothing in spec.md calls for one.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/api/session/create", post(sessions::create_session))
        .route("/api/session/history", get(sessions::history))
        .route("/api/session/:id", get(sessions::get_session))
        .route("/api/session/:id/start", post(sessions::start))
        .route("/api/session/:id/pause", post(sessions::pause))
        .route("/api/session/:id/resume", post(sessions::resume))
        .route("/api/session/:id/stop", post(sessions::stop))
        .route("/api/session/:id/settings", patch(sessions::update_settings))
        .route("/api/provider/:id/set", post(providers::set))
        .route("/api/provider/:id/models", get(providers::models))
        .route("/api/provider/:id/select-model", post(providers::select_model))
        .route("/api/provider/:id/current", get(providers::current))
        .route("/api/branch/:id", get(branches::get_branches))
        .route("/api/branch/:id/fork", post(branches::fork))
        .route("/api/branch/:id/switch", post(branches::switch))
        .route("/api/timeline/:id", get(timeline::get_timeline))
        .route("/api/message/:id/last", delete(timeline::delete_last_message))
        .route("/api/message/:id/:message_id", patch(timeline::edit_message))
        .route("/api/intervention/:id", post(interventions::enqueue))
        .route("/api/debug/settings", get(debug::get).patch(debug::patch))
        .route("/ws/:session_id", get(ws::upgrade))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
