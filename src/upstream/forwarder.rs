//! Outbound calls to the analytics collector.
//!
//! # Responsibilities
//! - Build the two upstream URLs from the configured base
//! - Forward only `user-agent` and `referer` from the inbound request
//! - Pass the event body through byte-for-byte
//! - Hand back the upstream status and a streaming body
//!
//! A single attempt is made per request. Transport failures surface as
//! `ProxyError::UpstreamUnavailable`; non-2xx responses are returned as-is.
//!
//! The response timeout bounds the wait for upstream's status line only.
//! Once a status is handed to the client the body streams to completion,
//! however slowly either side reads or writes it.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
};
use http_body_util::LengthLimitError;
use url::Url;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::error::ProxyError;

/// Upstream path serving the client script.
pub const SCRIPT_UPSTREAM_PATH: &str = "/js/plausible.js";

/// Upstream path accepting events.
pub const EVENT_UPSTREAM_PATH: &str = "/api/event";

/// Inbound headers propagated upstream. Everything else is dropped.
const FORWARDED_HEADERS: [header::HeaderName; 2] = [header::USER_AGENT, header::REFERER];

/// Status and body of an upstream response.
///
/// Upstream headers are deliberately not carried; the caller decides what
/// the client sees.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Body,
}

impl UpstreamResponse {
    fn streaming(response: reqwest::Response) -> Self {
        Self {
            status: response.status(),
            body: Body::from_stream(response.bytes_stream()),
        }
    }
}

/// Client for the fixed upstream.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    script_url: Url,
    event_url: Url,
    max_body_size: usize,
    response_timeout: Option<Duration>,
}

impl Forwarder {
    pub fn new(
        upstream: &UpstreamConfig,
        timeouts: &TimeoutConfig,
        max_body_size: usize,
    ) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(ProxyError::ClientBuild)?;

        Ok(Self {
            client,
            script_url: upstream_url(&upstream.base_url, SCRIPT_UPSTREAM_PATH)?,
            event_url: upstream_url(&upstream.base_url, EVENT_UPSTREAM_PATH)?,
            max_body_size,
            response_timeout: (timeouts.request_secs > 0)
                .then(|| Duration::from_secs(timeouts.request_secs)),
        })
    }

    pub fn script_url(&self) -> &Url {
        &self.script_url
    }

    pub fn event_url(&self) -> &Url {
        &self.event_url
    }

    /// `GET <upstream>/js/plausible.js`.
    pub async fn fetch_script(&self, inbound: &HeaderMap) -> Result<UpstreamResponse, ProxyError> {
        let request = self
            .client
            .get(self.script_url.clone())
            .headers(forwarded_headers(inbound));

        self.send(request).await
    }

    /// `POST <upstream>/api/event` with the inbound body, unparsed.
    pub async fn forward_event(
        &self,
        inbound: &HeaderMap,
        body: Body,
    ) -> Result<UpstreamResponse, ProxyError> {
        let limit = self.max_body_size;
        if declared_length(inbound).is_some_and(|len| len > limit) {
            return Err(ProxyError::PayloadTooLarge { limit });
        }

        let payload = axum::body::to_bytes(body, limit).await.map_err(|err| {
            let inner = err.into_inner();
            if inner.downcast_ref::<LengthLimitError>().is_some() {
                ProxyError::PayloadTooLarge { limit }
            } else {
                ProxyError::InvalidBody(axum::Error::new(inner))
            }
        })?;

        let mut headers = forwarded_headers(inbound);
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let request = self
            .client
            .post(self.event_url.clone())
            .headers(headers)
            .body(payload);

        self.send(request).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<UpstreamResponse, ProxyError> {
        let pending = request.send();
        let response = match self.response_timeout {
            Some(after) => tokio::time::timeout(after, pending)
                .await
                .map_err(|_| ProxyError::UpstreamTimeout { after })?,
            None => pending.await,
        }
        .map_err(ProxyError::UpstreamUnavailable)?;

        Ok(UpstreamResponse::streaming(response))
    }
}

fn upstream_url(base: &str, path: &str) -> Result<Url, ProxyError> {
    let raw = format!("{}{}", base.trim_end_matches('/'), path);
    Url::parse(&raw).map_err(|source| ProxyError::InvalidUpstream { url: raw, source })
}

/// The propagated subset of inbound headers, absent ones sent empty.
fn forwarded_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(FORWARDED_HEADERS.len() + 1);
    for name in FORWARDED_HEADERS {
        let value = inbound
            .get(&name)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(""));
        headers.insert(name, value);
    }
    headers
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
