//! Error taxonomy for request handling.
//!
//! Every variant that can occur while serving a request maps onto a
//! well-formed HTTP response; nothing on the request path panics.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors produced while handling a proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The serving host is not in the configured allowlist.
    #[error("host {0:?} is not allowed")]
    Forbidden(String),

    /// No route matches the method and path.
    #[error("no route for {method} {path}")]
    NotFound { method: String, path: String },

    /// The event body exceeds the configured limit.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The event body could not be read from the client.
    #[error("failed to read request body: {0}")]
    InvalidBody(#[source] axum::Error),

    /// The outbound call failed before a response arrived
    /// (DNS, connect, timeout).
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[source] reqwest::Error),

    /// Upstream did not answer with a status line in time.
    #[error("upstream did not respond within {after:?}")]
    UpstreamTimeout { after: Duration },

    /// The configured upstream base does not form a valid URL.
    #[error("invalid upstream URL {url:?}: {source}")]
    InvalidUpstream {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The outbound HTTP client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ProxyError {
    /// HTTP status this error renders as.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Forbidden(_) => StatusCode::FORBIDDEN,
            ProxyError::NotFound { .. } => StatusCode::NOT_FOUND,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamUnavailable(_) | ProxyError::UpstreamTimeout { .. } => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::InvalidUpstream { .. } | ProxyError::ClientBuild(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether CORS headers are attached to the rendered response.
    ///
    /// Allowlist rejections stay opaque to probing clients.
    pub fn exposes_cors(&self) -> bool {
        !matches!(self, ProxyError::Forbidden(_))
    }

    /// Whether the security header set is attached to the rendered response.
    pub fn carries_security_headers(&self) -> bool {
        !matches!(self, ProxyError::Forbidden(_) | ProxyError::NotFound { .. })
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ProxyError::Forbidden(_) => status.into_response(),
            ProxyError::NotFound { .. } => (status, "Not found").into_response(),
            ProxyError::PayloadTooLarge { .. } => (status, "Payload too large").into_response(),
            ProxyError::InvalidBody(_) => (status, "Bad request").into_response(),
            ProxyError::UpstreamUnavailable(_) | ProxyError::UpstreamTimeout { .. } => {
                (status, "Bad gateway").into_response()
            }
            ProxyError::InvalidUpstream { .. } | ProxyError::ClientBuild(_) => {
                (status, "Internal server error").into_response()
            }
        }
    }
}
