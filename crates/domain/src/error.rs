/// Shared error type used across all worldline crates.
///
/// Variants line up with the error taxonomy in the runtime spec: each one
/// carries the information the gateway needs to map it to an HTTP status
/// code or an `error` event, without leaking secrets.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("precondition failed: {code}: {message}")]
    PreconditionFailed { code: String, message: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("busy: {0}")]
    Busy(String),

    #[error("provider client error ({status}): {body_excerpt}")]
    ProviderClient { status: u16, body_excerpt: String },

    #[error("provider transient error: {0}")]
    ProviderTransient(String),

    #[error("provider protocol error: {0}")]
    ProviderProtocol(String),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable code for the `error` event / HTTP body (§7).
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::PreconditionFailed { .. } => "PRECONDITION_FAILED",
            Error::Conflict(_) => "CONFLICT",
            Error::Busy(_) => "BUSY",
            Error::ProviderClient { .. } => "PROVIDER_CLIENT_ERROR",
            Error::ProviderTransient(_) => "PROVIDER_TRANSIENT_ERROR",
            Error::ProviderProtocol(_) => "PROVIDER_PROTOCOL_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Other(_) => "OTHER",
        }
    }

    /// Whether the Runner should retry this error with backoff (§4.5, §7).
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::ProviderTransient(_))
    }
}
