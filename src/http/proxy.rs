//! The `/proxy` endpoint.
//!
//! `GET /proxy?url=<raw>`: normalize the raw input, fetch it once, then
//! rewrite (HTML) or stream (everything else) the upstream response.

use std::time::Instant;

use axum::{
    extract::{RawQuery, State},
    response::{IntoResponse, Response},
    Extension,
};
use tower_http::request_id::RequestId;

use crate::error::ProxyError;
use crate::http::server::AppState;
use crate::input::{normalize, NormalizedTarget};
use crate::observability::metrics;
use crate::rewrite::{transform, ContentKind};

/// First `url` value of a query string, form-decoded.
///
/// Parsed by hand rather than through a typed extractor so that repeated or
/// odd parameters never turn into a framework rejection.
pub fn url_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
}

pub async fn proxy_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    RawQuery(query): RawQuery,
) -> Response {
    let start = Instant::now();
    let request_id = request_id.header_value().to_str().unwrap_or("invalid");
    let raw = url_param(query.as_deref());

    let Some(target) = normalize(raw.as_deref()) else {
        tracing::warn!(request_id = %request_id, "Missing url parameter");
        metrics::record_request("error", 400, start);
        return ProxyError::InputMissing.into_response();
    };

    tracing::info!(request_id = %request_id, target = %target, "Proxying request");

    match forward(&state, &target).await {
        Ok((kind, response)) => {
            let label = match kind {
                ContentKind::Html => "html",
                ContentKind::Passthrough => "passthrough",
            };
            tracing::debug!(
                request_id = %request_id,
                target = %target,
                status = %response.status(),
                kind = label,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Upstream response relayed"
            );
            metrics::record_request(label, response.status().as_u16(), start);
            response
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, target = %target, error = %e, "Upstream error");
            metrics::record_request("error", e.status().as_u16(), start);
            e.into_response()
        }
    }
}

async fn forward(
    state: &AppState,
    target: &NormalizedTarget,
) -> Result<(ContentKind, Response), ProxyError> {
    let upstream = state.client.fetch(target).await?;
    let kind = ContentKind::classify(upstream.content_type());
    let response = transform(upstream, target, state.max_html_bytes).await?;
    Ok((kind, response))
}
