//! Free-form input classification.
//!
//! Rules are applied in order, first match wins:
//! 1. blank → `None`
//! 2. `http://` / `https://` prefix (any case) → unchanged
//! 3. contains `.` and no whitespace → `https://` + text
//! 4. anything else → search phrase

use std::fmt;

use url::Url;

/// Search endpoint used for free-text input. The encoded phrase is appended.
pub const SEARCH_ENDPOINT: &str = "https://duckduckgo.com/html/?q=";

/// An absolute `http`/`https` URL ready to be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedTarget(String);

impl NormalizedTarget {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Parse into a `Url`, used as the base for link resolution.
    pub fn to_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.0)
    }
}

impl fmt::Display for NormalizedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedTarget {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Turn raw user input into a fetchable absolute URL.
///
/// Returns `None` when the input is absent or only whitespace.
pub fn normalize(raw: Option<&str>) -> Option<NormalizedTarget> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }

    if has_http_scheme(text) {
        return Some(NormalizedTarget(text.to_string()));
    }

    if text.contains('.') && !text.chars().any(char::is_whitespace) {
        return Some(NormalizedTarget(format!("https://{}", text)));
    }

    Some(NormalizedTarget(format!(
        "{}{}",
        SEARCH_ENDPOINT,
        urlencoding::encode(text)
    )))
}

fn has_http_scheme(text: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        text.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}
