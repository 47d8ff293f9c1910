//! Input normalization subsystem.
//!
//! # Data Flow
//! ```text
//! ?url=<raw text>
//!     → normalizer.rs (classify: absolute URL / bare host / search phrase)
//!     → NormalizedTarget (absolute http(s) URL)
//!     → upstream fetch
//! ```
//!
//! # Design Decisions
//! - Cheap heuristic classifier, not a URL grammar validator
//! - Blank input is a value (`None`), not an error; the handler maps it to 400

pub mod normalizer;

pub use normalizer::{normalize, NormalizedTarget, SEARCH_ENDPOINT};
