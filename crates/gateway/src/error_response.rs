//! Maps `ws_domain::Error` to the HTTP error schema in spec.md §7:
//! `{code, message, hint?}`, with secrets always redacted (`Error`'s
//! `Display` never interpolates plaintext key material; see ws-domain).
//!
//! Grounded on the teacher's `auth::require_api_token` JSON-error-body
//! convention (`crates/gateway/src/api/auth.rs`).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ws_domain::Error;

pub struct AppError(pub Error);

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let status = match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::PreconditionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Conflict(_) | Error::Busy(_) => StatusCode::CONFLICT,
            Error::ProviderClient { .. } | Error::ProviderProtocol(_) => StatusCode::BAD_GATEWAY,
            Error::ProviderTransient(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Io(_) | Error::Json(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "code": code,
            "message": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
