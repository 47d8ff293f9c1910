//! Rewrite-or-stream decision for upstream responses.
//!
//! # Branches
//! - HTML (`content-type` contains `text/html`): buffer, rewrite links,
//!   inject banner, reply with status + `content-type` only
//! - Anything else: reply with status + filtered headers, stream body as-is

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use futures_util::StreamExt;
use url::Url;

use crate::error::ProxyError;
use crate::input::NormalizedTarget;
use crate::rewrite::{banner, links};
use crate::upstream::{UpstreamBody, UpstreamResponse};

/// Headers describing the upstream link's transport, not the resource.
pub static STRIPPED_HEADERS: [HeaderName; 2] = [header::CONTENT_ENCODING, header::TRANSFER_ENCODING];

/// How a response body is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Passthrough,
}

impl ContentKind {
    /// Substring match on the declared type; no MIME parsing.
    pub fn classify(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.to_ascii_lowercase().contains("text/html") => ContentKind::Html,
            _ => ContentKind::Passthrough,
        }
    }
}

/// Rewrite links against `base`, then add the banner.
pub fn rewrite_document(html: &str, base: &Url) -> String {
    let rewrite = links::rewrite_links(html, base);
    tracing::debug!(
        base = %base,
        rewritten = rewrite.rewritten,
        skipped = rewrite.skipped,
        "Rewrote document links"
    );
    metrics::counter!("proxy_links_rewritten_total").increment(rewrite.rewritten as u64);
    banner::inject_banner(&rewrite.html)
}

/// Copy all headers except the stripped transport headers.
pub fn filter_passthrough_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if STRIPPED_HEADERS.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Turn an upstream response into the response sent to the client.
///
/// `max_html_bytes` caps how much of an HTML body is buffered.
pub async fn transform(
    upstream: UpstreamResponse,
    base: &NormalizedTarget,
    max_html_bytes: usize,
) -> Result<Response, ProxyError> {
    match ContentKind::classify(upstream.content_type()) {
        ContentKind::Html => transform_html(upstream, base, max_html_bytes).await,
        ContentKind::Passthrough => Ok(passthrough(upstream)),
    }
}

async fn transform_html(
    upstream: UpstreamResponse,
    base: &NormalizedTarget,
    max_html_bytes: usize,
) -> Result<Response, ProxyError> {
    let content_type = upstream.headers.get(header::CONTENT_TYPE).cloned();
    let bytes = read_limited(upstream.body, max_html_bytes).await?;
    let text = String::from_utf8_lossy(&bytes);

    let body = match base.to_url() {
        Ok(base_url) => rewrite_document(&text, &base_url),
        Err(e) => {
            // Nothing can resolve against an unparseable base; links stay put.
            tracing::warn!(base = %base, error = %e, "Unparseable base URL, skipping link rewrite");
            banner::inject_banner(&text)
        }
    };

    Ok(build_response(upstream.status, content_type, Body::from(body)))
}

fn build_response(status: StatusCode, content_type: Option<HeaderValue>, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    if let Some(ct) = content_type {
        response.headers_mut().insert(header::CONTENT_TYPE, ct);
    }
    response
}

fn passthrough(upstream: UpstreamResponse) -> Response {
    let mut response = Response::new(Body::from_stream(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = filter_passthrough_headers(&upstream.headers);
    response
}

/// Collect a body stream, failing once it grows past `limit` bytes.
async fn read_limited(mut body: UpstreamBody, limit: usize) -> Result<Vec<u8>, ProxyError> {
    let mut buf = Vec::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        if buf.len() + chunk.len() > limit {
            return Err(ProxyError::BodyTooLarge(limit));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Bytes};
    use futures_util::stream;

    const LIMIT: usize = 1024 * 1024;

    fn upstream(
        status: StatusCode,
        headers: &[(&'static str, &'static str)],
        chunks: Vec<Result<Bytes, ProxyError>>,
    ) -> UpstreamResponse {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            map.append(*k, HeaderValue::from_static(*v));
        }
        UpstreamResponse {
            status,
            headers: map,
            body: Box::pin(stream::iter(chunks)),
        }
    }

    fn target(url: &str) -> NormalizedTarget {
        crate::input::normalize(Some(url)).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(ContentKind::classify(Some("text/html")), ContentKind::Html);
        assert_eq!(
            ContentKind::classify(Some("Text/HTML; charset=UTF-8")),
            ContentKind::Html
        );
        assert_eq!(ContentKind::classify(Some("image/png")), ContentKind::Passthrough);
        assert_eq!(
            ContentKind::classify(Some("application/xhtml+xml")),
            ContentKind::Passthrough
        );
        assert_eq!(ContentKind::classify(None), ContentKind::Passthrough);
    }

    #[test]
    fn test_filter_strips_transport_headers_only() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("image/png"));
        headers.insert(
            HeaderName::from_bytes(b"Content-Encoding").unwrap(),
            HeaderValue::from_static("gzip"),
        );
        headers.insert(
            HeaderName::from_bytes(b"TRANSFER-ENCODING").unwrap(),
            HeaderValue::from_static("chunked"),
        );
        headers.insert("cache-control", HeaderValue::from_static("max-age=60"));
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));

        let out = filter_passthrough_headers(&headers);
        assert!(out.get(header::CONTENT_ENCODING).is_none());
        assert!(out.get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(out.get("content-type").unwrap(), "image/png");
        assert_eq!(out.get("cache-control").unwrap(), "max-age=60");
        assert_eq!(out.get_all("set-cookie").iter().count(), 2);
    }

    #[tokio::test]
    async fn test_html_is_rewritten_with_banner() {
        let html = r##"<html><body class="x"><a href="/page">p</a><a href="#top">t</a></body></html>"##;
        let up = upstream(
            StatusCode::OK,
            &[
                ("content-type", "text/html; charset=utf-8"),
                ("set-cookie", "sid=1"),
                ("content-length", "999"),
            ],
            vec![Ok(Bytes::from_static(html.as_bytes()))],
        );

        let response = transform(up, &target("https://example.com/dir/"), LIMIT)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().len(), 1);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );

        let body = body_string(response).await;
        assert!(body.contains(r#"href="/proxy?url=https%3A%2F%2Fexample.com%2Fpage""#));
        assert!(body.contains(r##"<a href="#top">"##));
        assert!(body.starts_with(&format!(r#"<html><body class="x">{}"#, banner::BANNER_HTML)));
    }

    #[tokio::test]
    async fn test_html_keeps_upstream_status() {
        let up = upstream(
            StatusCode::NOT_FOUND,
            &[("content-type", "text/html")],
            vec![Ok(Bytes::from_static(b"<p>missing</p>"))],
        );
        let response = transform(up, &target("https://example.com/"), LIMIT)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_string(response).await;
        assert!(body.starts_with(banner::BANNER_HTML));
        assert!(body.ends_with("<p>missing</p>"));
    }

    #[tokio::test]
    async fn test_html_split_across_chunks() {
        let up = upstream(
            StatusCode::OK,
            &[("content-type", "text/html")],
            vec![
                Ok(Bytes::from_static(b"<body><img sr")),
                Ok(Bytes::from_static(b"c=\"a.png\"></body>")),
            ],
        );
        let body = body_string(
            transform(up, &target("https://example.com/x/"), LIMIT)
                .await
                .unwrap(),
        )
        .await;
        assert!(body.contains(r#"src="/proxy?url=https%3A%2F%2Fexample.com%2Fx%2Fa.png""#));
    }

    #[tokio::test]
    async fn test_html_over_limit_fails() {
        let up = upstream(
            StatusCode::OK,
            &[("content-type", "text/html")],
            vec![Ok(Bytes::from(vec![b'a'; 64])), Ok(Bytes::from(vec![b'b'; 64]))],
        );
        let err = transform(up, &target("https://example.com/"), 100)
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::BodyTooLarge(100)));
    }

    #[tokio::test]
    async fn test_html_read_error_surfaces() {
        let up = upstream(
            StatusCode::OK,
            &[("content-type", "text/html")],
            vec![
                Ok(Bytes::from_static(b"<body>")),
                Err(ProxyError::upstream("connection reset")),
            ],
        );
        let err = transform(up, &target("https://example.com/"), LIMIT)
            .await
            .unwrap_err();
        assert_eq!(err.body(), "Proxy error: connection reset");
    }

    #[tokio::test]
    async fn test_passthrough_forwards_headers_and_bytes() {
        let payload: Vec<u8> = (0u8..=255).collect();
        let up = upstream(
            StatusCode::PARTIAL_CONTENT,
            &[
                ("content-type", "image/png"),
                ("content-encoding", "gzip"),
                ("x-custom", "kept"),
                ("etag", "\"abc\""),
            ],
            vec![
                Ok(Bytes::from(payload[..100].to_vec())),
                Ok(Bytes::from(payload[100..].to_vec())),
            ],
        );

        let response = transform(up, &target("https://example.com/img.png"), LIMIT)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        let headers = response.headers();
        assert!(headers.get("content-encoding").is_none());
        assert_eq!(headers.get("content-type").unwrap(), "image/png");
        assert_eq!(headers.get("x-custom").unwrap(), "kept");
        assert_eq!(headers.get("etag").unwrap(), "\"abc\"");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), payload.as_slice());
    }

    #[tokio::test]
    async fn test_passthrough_ignores_html_limit() {
        let up = upstream(
            StatusCode::OK,
            &[("content-type", "application/octet-stream")],
            vec![Ok(Bytes::from(vec![7u8; 4096]))],
        );
        let response = transform(up, &target("https://example.com/blob"), 16)
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.len(), 4096);
    }

    #[tokio::test]
    async fn test_missing_content_type_streams() {
        let up = upstream(
            StatusCode::OK,
            &[],
            vec![Ok(Bytes::from_static(b"<body>not rewritten"))],
        );
        let response = transform(up, &target("https://example.com/"), LIMIT)
            .await
            .unwrap();
        assert_eq!(body_string(response).await, "<body>not rewritten");
    }
}
