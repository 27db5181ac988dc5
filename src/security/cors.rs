//! Cross-origin policy evaluation.
//!
//! Only the site that owns the analytics subdomain may read responses:
//! for a serving host `analytics.example.com` the accepted origins are
//! `https://example.com` and `https://www.example.com`.
//!
//! Requests from other origins are never refused here. They get `Vary: Origin`
//! and nothing else, so the browser delivers the request but hides the
//! response from the page.

use axum::http::header::{self, HeaderMap, HeaderValue};

/// `access-control-allow-methods` value.
pub const ALLOW_METHODS: &str = "GET,POST,OPTIONS";

/// `access-control-allow-headers` value.
pub const ALLOW_HEADERS: &str = "content-type";

/// `access-control-max-age` value, in seconds.
pub const MAX_AGE_SECS: u32 = 86_400;

/// Derives `Access-Control-*` headers from the serving host and request origin.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    site_prefix: String,
}

impl CorsPolicy {
    /// Create a policy that strips `site_prefix` from the serving host to
    /// find the site root. An empty prefix leaves the host unchanged.
    pub fn new(site_prefix: impl Into<String>) -> Self {
        Self {
            site_prefix: site_prefix.into(),
        }
    }

    /// The site root for a serving host.
    pub fn root_domain<'a>(&self, host: &'a str) -> &'a str {
        if self.site_prefix.is_empty() {
            return host;
        }
        host.strip_prefix(self.site_prefix.as_str()).unwrap_or(host)
    }

    /// The two origins allowed to read responses served from `host`.
    pub fn allowed_origins(&self, host: &str) -> [String; 2] {
        let root = self.root_domain(host);
        [format!("https://{root}"), format!("https://www.{root}")]
    }

    /// Whether `origin` may read responses served from `host`.
    pub fn is_allowed(&self, host: &str, origin: &str) -> bool {
        self.allowed_origins(host).iter().any(|allowed| allowed == origin)
    }

    /// Compute the CORS headers for a request.
    ///
    /// An empty `Origin` counts as absent. A value that is not valid UTF-8
    /// cannot match an allowed origin and is treated as foreign.
    pub fn evaluate(&self, host: &str, origin: Option<&HeaderValue>) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(5);

        match origin.filter(|o| !o.is_empty()) {
            None => append_grants(&mut headers),
            Some(value) => {
                let allowed = value
                    .to_str()
                    .map(|origin| self.is_allowed(host, origin))
                    .unwrap_or(false);

                if allowed {
                    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value.clone());
                    append_grants(&mut headers);
                }
            }
        }

        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        headers
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new("analytics.")
    }
}

fn append_grants(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(MAX_AGE_SECS));
}
