//! Informational banner shown at the top of every rewritten page.

use std::sync::LazyLock;

use regex::Regex;

/// Text every banner contains; tests and clients can look for it.
pub const BANNER_MARKER: &str = "Viewing through rewrite-proxy";

/// Self-contained banner markup: inline styles only, no external resources.
pub const BANNER_HTML: &str = concat!(
    r#"<div id="rewrite-proxy-banner" style="position:relative;z-index:2147483647;"#,
    r#"margin:0;padding:6px 12px;background:#1f2933;color:#f5f7fa;"#,
    r#"font:13px/1.4 system-ui,sans-serif;text-align:center;border-bottom:2px solid #3e4c59">"#,
    "Viewing through rewrite-proxy",
    r#" &middot; links on this page are routed through the proxy</div>"#,
);

static BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body(?:\s[^>]*)?>").expect("body pattern is valid"));

/// Insert the banner right after the first `<body …>` tag, or at the start.
pub fn inject_banner(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + BANNER_HTML.len());
    match BODY_OPEN.find(html) {
        Some(tag) => {
            out.push_str(&html[..tag.end()]);
            out.push_str(BANNER_HTML);
            out.push_str(&html[tag.end()..]);
        }
        None => {
            out.push_str(BANNER_HTML);
            out.push_str(html);
        }
    }
    out
}
