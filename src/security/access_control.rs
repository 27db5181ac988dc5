//! Host allowlist gate.
//!
//! Optional pre-filter run before routing: when an allowlist is configured,
//! requests whose serving host is not listed are refused.
//!
//! # Design Decisions
//! - Exact comparison against the normalised serving host, no wildcard or
//!   suffix matching; entries are lowercased so hostname case never matters
//! - An empty allowlist means no restriction
//! - A missing host never passes a non-empty allowlist

use crate::error::ProxyError;

/// Split a comma-separated host list, trimming entries and dropping blanks.
pub fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .collect()
}

/// Immutable set of hosts this proxy is willing to serve.
#[derive(Debug, Clone, Default)]
pub struct HostAllowlist {
    hosts: Vec<String>,
}

impl HostAllowlist {
    pub fn new(hosts: Vec<String>) -> Self {
        let hosts = hosts.into_iter().map(|h| h.to_ascii_lowercase()).collect();
        Self { hosts }
    }

    /// Build from an `ALLOW_HOSTS`-style comma-separated value.
    pub fn from_csv(raw: &str) -> Self {
        Self::new(parse_host_list(raw))
    }

    /// True when no allowlist is configured.
    pub fn is_unrestricted(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Whether a request for `host` may proceed. `host` is expected
    /// lowercased, as `request_host` returns it.
    pub fn permits(&self, host: Option<&str>) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        match host {
            Some(host) => self.hosts.iter().any(|allowed| allowed == host),
            None => false,
        }
    }

    /// Gate a request, returning `ProxyError::Forbidden` on rejection.
    pub fn check(&self, host: Option<&str>) -> Result<(), ProxyError> {
        if self.permits(host) {
            Ok(())
        } else {
            Err(ProxyError::Forbidden(host.unwrap_or_default().to_string()))
        }
    }
}
