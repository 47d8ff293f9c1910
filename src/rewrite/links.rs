//! Resource-reference rewriting.
//!
//! Scans for double-quoted `href="…"` / `src="…"` assignments and points
//! them back at the proxy. Everything outside a match is copied byte for
//! byte, and a match that cannot be rewritten is left exactly as written.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

/// Path prefix for proxy-relative links. The encoded target follows.
pub const PROXY_PATH: &str = "/proxy?url=";

static LINK_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(href|src)="([^"]*)""#).expect("link pattern is valid"));

/// Schemes and fragments that are never routed through the proxy.
const EXEMPT_PREFIXES: [&str; 4] = ["#", "javascript:", "mailto:", "data:"];

/// Result of a rewrite pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRewrite {
    pub html: String,
    /// Attributes pointed at the proxy.
    pub rewritten: usize,
    /// Matched attributes left alone (exempt or unresolvable).
    pub skipped: usize,
}

/// Build the proxy-relative path for an absolute URL.
pub fn proxy_path(url: &Url) -> String {
    format!("{}{}", PROXY_PATH, urlencoding::encode(url.as_str()))
}

/// Rewrite every matched attribute in `html` against `base`.
pub fn rewrite_links(html: &str, base: &Url) -> LinkRewrite {
    let mut rewritten = 0;
    let mut skipped = 0;

    let out = LINK_ATTR.replace_all(html, |caps: &Captures| {
        let attr = &caps[1];
        match resolve(&caps[2], base) {
            Some(target) => {
                rewritten += 1;
                format!(r#"{}="{}""#, attr, proxy_path(&target))
            }
            None => {
                skipped += 1;
                caps[0].to_string()
            }
        }
    });

    LinkRewrite {
        html: out.into_owned(),
        rewritten,
        skipped,
    }
}

/// Resolve an attribute value, or `None` if it must stay untouched.
fn resolve(value: &str, base: &Url) -> Option<Url> {
    let value = value.trim();
    if is_exempt(value) {
        return None;
    }
    match base.join(value) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::trace!(value = %value, error = %e, "Leaving unresolvable link");
            None
        }
    }
}

fn is_exempt(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    EXEMPT_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}
