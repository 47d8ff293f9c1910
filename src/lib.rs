//! Forwarding HTTP proxy with HTML link rewriting.
//!
//! # Architecture Overview
//!
//! ```text
//!     GET /proxy?url=<raw>
//!  ───────────────────────────▶ http::proxy
//!                                  │
//!                                  ▼
//!                           input::normalize ── blank ──▶ 400
//!                                  │ NormalizedTarget
//!                                  ▼
//!                           upstream::fetch ── failure ──▶ 500 "Proxy error: …"
//!                                  │ UpstreamResponse
//!                                  ▼
//!                         rewrite::transform
//!                        ┌─────────┴──────────┐
//!                    text/html             other
//!              links + banner        filtered headers,
//!              (buffered)            streamed body
//! ```
//!
//! Requests share no mutable state; each one runs as an independent task.

pub mod config;
pub mod error;
pub mod http;
pub mod input;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;
pub mod upstream;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use input::{normalize, NormalizedTarget};
pub use lifecycle::Shutdown;
