//! Provider configuration endpoints (§6.1, §6.3).

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use ws_domain::entities::ProviderKind;
use ws_domain::Error;

use crate::error_response::{AppError, AppResult};
use crate::service::SimulationService;
use crate::state::AppState;

fn parse_provider(s: &str) -> Result<ProviderKind, Error> {
    match s.to_ascii_lowercase().as_str() {
        "openai" => Ok(ProviderKind::Openai),
        "deepseek" => Ok(ProviderKind::Deepseek),
        "ollama" => Ok(ProviderKind::Ollama),
        "gemini" => Ok(ProviderKind::Gemini),
        "mock" => Ok(ProviderKind::Mock),
        other => Err(Error::Validation(format!("unknown provider: {other}"))),
    }
}

#[derive(Debug, Deserialize)]
pub struct SetProviderBody {
    pub provider: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
}

pub async fn set(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<SetProviderBody>,
) -> AppResult<impl IntoResponse> {
    let provider = parse_provider(&body.provider).map_err(AppError)?;
    let svc = SimulationService::new(&state);
    let view = svc
        .provider_set(
            &session_id,
            provider,
            &body.base_url,
            body.api_key.as_deref(),
            body.model_name.as_deref(),
        )
        .await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct ModelsQuery {
    pub provider: String,
}

pub async fn models(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<ModelsQuery>,
) -> AppResult<impl IntoResponse> {
    let provider = parse_provider(&query.provider).map_err(AppError)?;
    let svc = SimulationService::new(&state);
    let models = svc.provider_models(&session_id, provider).await?;
    Ok(Json(serde_json::json!({ "provider": query.provider, "models": models })))
}

#[derive(Debug, Deserialize)]
pub struct SelectModelBody {
    pub model_name: String,
}

pub async fn select_model(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<SelectModelBody>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let view = svc.provider_select_model(&session_id, &body.model_name).await?;
    Ok(Json(view))
}

pub async fn current(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let svc = SimulationService::new(&state);
    let view = svc.provider_current(&session_id).await?;
    Ok(Json(view))
}
