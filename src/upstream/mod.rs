//! Upstream fetch subsystem.
//!
//! # Data Flow
//! ```text
//! NormalizedTarget
//!     → client.rs (GET with browser User-Agent, bounded by timeouts)
//!     → UpstreamResponse { status, headers, streaming body }
//!     → rewrite::transformer
//! ```
//!
//! # Design Decisions
//! - Single attempt, no retries
//! - Time to headers and the gap between body reads are bounded; total
//!   body duration is not, so large downloads stream to completion
//! - Body is exposed as a stream so passthrough never buffers
//! - Compressed bodies are decoded by the client, so `content-encoding`
//!   can be dropped downstream without corrupting the payload
//! - Dropping the request future cancels the in-flight fetch

pub mod client;

use std::pin::Pin;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use futures_util::{stream, Stream, StreamExt};

use crate::error::ProxyError;

pub use client::{UpstreamClient, DEFAULT_USER_AGENT};

/// Boxed stream of upstream body chunks.
pub type UpstreamBody = Pin<Box<dyn Stream<Item = Result<Bytes, ProxyError>> + Send>>;

/// Fail the stream when no chunk arrives within `idle`.
///
/// The stream ends after the first error, so a stalled origin surfaces once.
pub fn idle_bounded(body: UpstreamBody, idle: Duration) -> UpstreamBody {
    Box::pin(stream::unfold(Some(body), move |state| async move {
        let mut body = state?;
        match tokio::time::timeout(idle, body.next()).await {
            Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(body))),
            Ok(Some(Err(e))) => Some((Err(e), None)),
            Ok(None) => None,
            Err(_) => Some((
                Err(ProxyError::upstream(format!(
                    "upstream body stalled for more than {:?}",
                    idle
                ))),
                None,
            )),
        }
    }))
}

/// A fetched response whose body has not been consumed yet.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: UpstreamBody,
}

impl UpstreamResponse {
    /// Declared content type, if present and valid text.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
