//! Response transformation subsystem.
//!
//! # Data Flow
//! ```text
//! UpstreamResponse
//!     → transformer.rs (classify by content-type)
//!         HTML:  buffer → links.rs (href/src → /proxy?url=…) → banner.rs
//!         other: filter transport headers → stream body untouched
//!     → axum Response
//! ```
//!
//! # Design Decisions
//! - Tolerant pattern scan instead of an HTML parser: bytes outside a
//!   matched attribute are never touched, malformed markup survives
//! - Only double-quoted `href`/`src` values are considered
//! - A link that cannot be resolved is left as written, never dropped

pub mod banner;
pub mod links;
pub mod transformer;

pub use banner::{inject_banner, BANNER_HTML, BANNER_MARKER};
pub use links::{proxy_path, rewrite_links, LinkRewrite, PROXY_PATH};
pub use transformer::{filter_passthrough_headers, rewrite_document, transform, ContentKind};
