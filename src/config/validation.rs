//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that parse but cannot
//! work (unparseable addresses, unsupported upstream schemes). All errors are
//! collected rather than stopping at the first.

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid {field} {value:?}: expected host:port")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid upstream base URL {0:?}")]
    InvalidUpstream(String),

    #[error("upstream base URL must use http or https, got {0:?}")]
    UnsupportedScheme(String),

    #[error("upstream base URL must not carry a query or fragment")]
    UpstreamHasQuery,

    #[error("invalid allowlist entry {0:?}")]
    InvalidAllowHost(String),

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
            }
            if url.query().is_some() || url.fragment().is_some() {
                errors.push(ValidationError::UpstreamHasQuery);
            }
        }
        Err(_) => errors.push(ValidationError::InvalidUpstream(config.upstream.base_url.clone())),
    }

    for host in &config.access.allow_hosts {
        if host.is_empty() || host.contains(',') || host.chars().any(char::is_whitespace) {
            errors.push(ValidationError::InvalidAllowHost(host.clone()));
        }
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
