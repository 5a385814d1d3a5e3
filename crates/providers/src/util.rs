//! Shared utility functions for provider adapters.

use ws_domain::Error;

/// Convert a [`reqwest::Error`] into the domain [`Error`] type. Timeouts and
/// connection failures are transient (Runner retries, §4.5); anything else
/// that escaped a status-code check is reported as a protocol error.
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() || e.is_connect() {
        Error::ProviderTransient(e.to_string())
    } else {
        Error::ProviderProtocol(e.to_string())
    }
}

/// Map an HTTP response status to the §7 client/transient split: 4xx is a
/// client error the user must fix (bad key, bad model); 5xx is transient.
pub(crate) fn status_to_error(status: reqwest::StatusCode, body_excerpt: String) -> Error {
    if status.is_server_error() {
        Error::ProviderTransient(format!("{status}: {body_excerpt}"))
    } else {
        Error::ProviderClient {
            status: status.as_u16(),
            body_excerpt,
        }
    }
}

/// Truncate a response body to the §7 512-char excerpt limit before it goes
/// into an error — bodies can carry secrets echoed back by a misconfigured
/// provider and must never be logged in full.
pub(crate) fn excerpt(body: &str) -> String {
    if body.len() <= 512 {
        body.to_string()
    } else {
        let mut s = body.chars().take(512).collect::<String>();
        s.push('…');
        s
    }
}
