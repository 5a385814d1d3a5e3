//! `GET /healthz` (§6.6): liveness/readiness probe. Grounded on the
//! teacher's `crates/gateway/src/api/admin/health.rs` convention, narrowed
//! to the one ambient endpoint SPEC_FULL.md adds — no `/metrics` surface
//! (spec.md's Non-goals exclude it at the outer boundary).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = sqlx::query("SELECT 1").execute(&state.store.pool()).await.is_ok();

    let status = if db_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status,
        Json(serde_json::json!({
            "status": if db_ok { "ok" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "db_reachable": db_ok,
        })),
    )
}
