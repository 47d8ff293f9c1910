//! HTTP client used to reach origin servers.

use std::time::Duration;

use futures_util::TryStreamExt;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::input::NormalizedTarget;
use crate::upstream::{idle_bounded, UpstreamBody, UpstreamResponse};

/// Desktop Chrome on Windows; plain bot-looking agents get blocked by many origins.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Thin wrapper over a shared `reqwest::Client`.
///
/// No total timeout is set on the client: it would also cover body reads
/// and cut long passthrough streams short. Headers and each body read are
/// bounded separately instead.
#[derive(Clone, Debug)]
pub struct UpstreamClient {
    client: reqwest::Client,
    response_timeout: Duration,
    idle_timeout: Duration,
}

impl UpstreamClient {
    /// Build a client from the upstream configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            response_timeout: Duration::from_secs(config.response_timeout_secs),
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        })
    }

    /// Issue a single GET to `target`.
    ///
    /// Resolves once headers arrive; the body is left as a stream whose
    /// reads each fail after `idle_timeout` without data.
    pub async fn fetch(&self, target: &NormalizedTarget) -> Result<UpstreamResponse, ProxyError> {
        tracing::debug!(target = %target, "Fetching upstream");

        let send = self.client.get(target.as_str()).send();
        let response = tokio::time::timeout(self.response_timeout, send)
            .await
            .map_err(|_| {
                ProxyError::upstream(format!(
                    "no response headers within {:?}",
                    self.response_timeout
                ))
            })??;

        let status = response.status();
        let headers = response.headers().clone();

        tracing::debug!(
            target = %target,
            status = %status,
            content_type = ?headers.get(reqwest::header::CONTENT_TYPE),
            "Upstream responded"
        );

        let body: UpstreamBody = Box::pin(response.bytes_stream().map_err(ProxyError::from));

        Ok(UpstreamResponse {
            status,
            headers,
            body: idle_bounded(body, self.idle_timeout),
        })
    }
}
