//! Error types for the proxy.
//!
//! # Design Decisions
//! - One request-level error type; every variant is terminal to its request only
//! - Malformed links inside a document are never errors (see `rewrite::links`)
//! - Upstream failures carry the underlying description verbatim

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Fallback text for failures that carry no description.
pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Errors that can end a proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The `url` query parameter was absent or blank.
    #[error("Missing url parameter")]
    InputMissing,

    /// The origin could not be reached or its response could not be read.
    #[error("{0}")]
    Upstream(String),

    /// An HTML body grew past the configured buffering cap.
    #[error("response body exceeds {0} bytes")]
    BodyTooLarge(usize),
}

impl ProxyError {
    /// Wrap any upstream-side error, keeping only its description.
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        ProxyError::Upstream(err.to_string())
    }

    /// HTTP status reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InputMissing => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable description, never empty.
    pub fn description(&self) -> String {
        let text = self.to_string();
        if text.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            text
        }
    }

    /// Plain-text body sent to the client.
    pub fn body(&self) -> String {
        match self {
            ProxyError::InputMissing => self.to_string(),
            _ => format!("Proxy error: {}", self.description()),
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::upstream(describe_reqwest(&err))
    }
}

/// Flatten a reqwest error and its source chain into one line.
///
/// reqwest's top-level message is generic ("error sending request for url"),
/// the useful part (DNS, refused, TLS) lives in the sources.
fn describe_reqwest(err: &reqwest::Error) -> String {
    let mut text = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        let inner_text = inner.to_string();
        if !inner_text.is_empty() && !text.contains(&inner_text) {
            text.push_str(": ");
            text.push_str(&inner_text);
        }
        source = inner.source();
    }
    text
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.body()).into_response()
    }
}
