//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, middleware, graceful shutdown)
//!     → request ID layers (tower-http: set, propagate)
//!     → /proxy  → proxy.rs (normalize → fetch → transform)
//!       /healthz → liveness
//!       other   → static front-end (ServeDir)
//!     → Send to client
//! ```

pub mod proxy;
pub mod server;

pub use server::{AppState, HttpServer};
