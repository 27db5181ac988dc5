//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router and its middleware stack
//! - Wire up request IDs, tracing and the host allowlist gate
//! - Dispatch classified requests to the preflight, script, event or
//!   not-found handlers
//! - Observability (metrics, correlation IDs)

use axum::{
    extract::{Request, State},
    http::header,
    middleware,
    response::Response,
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::middleware::host_allowlist_middleware;
use crate::http::request::{request_host, request_id, UuidRequestId};
use crate::http::response;
use crate::observability::metrics;
use crate::routing::Route;
use crate::security::{CorsPolicy, HostAllowlist};
use crate::upstream::Forwarder;

/// Application state injected into handlers. Read-only for its lifetime.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub cors: Arc<CorsPolicy>,
    pub allowlist: Arc<HostAllowlist>,
}

impl AppState {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let forwarder = Forwarder::new(
            &config.upstream,
            &config.timeouts,
            config.security.max_body_size,
        )?;

        Ok(Self {
            forwarder: Arc::new(forwarder),
            cors: Arc::new(CorsPolicy::new(config.cors.site_prefix.clone())),
            allowlist: Arc::new(HostAllowlist::new(config.access.allow_hosts.clone())),
        })
    }
}

/// HTTP server for the analytics proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let state = AppState::from_config(&config)?;
        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Every request lands in `proxy_handler`; routing happens there so the
    /// priority order stays in one place.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                host_allowlist_middleware,
            ))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The fully layered router, e.g. for driving it without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            allow_hosts = ?self.config.access.allow_hosts,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Classifies the request, derives its CORS headers and answers it,
/// contacting upstream for the script and event routes.
async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let start_time = Instant::now();
    let (parts, body) = request.into_parts();

    let request_id = request_id(&parts.headers).to_string();
    let host = request_host(&parts.headers, &parts.uri).unwrap_or_default();
    let route = Route::classify(&parts.method, parts.uri.path());
    let cors = state.cors.evaluate(&host, parts.headers.get(header::ORIGIN));

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
        host = %host,
        route = route.label(),
        "Dispatching request"
    );

    let response = match route {
        Route::Preflight => response::preflight(cors),
        Route::Script => match state.forwarder.fetch_script(&parts.headers).await {
            Ok(upstream) => response::script(upstream, cors),
            Err(err) => failure(&request_id, route, err, cors),
        },
        Route::Event => match state.forwarder.forward_event(&parts.headers, body).await {
            Ok(upstream) => response::event(upstream, cors),
            Err(err) => failure(&request_id, route, err, cors),
        },
        Route::NotFound => {
            let err = ProxyError::NotFound {
                method: parts.method.to_string(),
                path: parts.uri.path().to_string(),
            };
            tracing::debug!(request_id = %request_id, error = %err, "No route matched");
            response::error(err, cors)
        }
    };

    metrics::record_request(
        route.label(),
        &parts.method,
        response.status().as_u16(),
        start_time,
    );
    response
}

fn failure(request_id: &str, route: Route, err: ProxyError, cors: header::HeaderMap) -> Response {
    match &err {
        ProxyError::UpstreamUnavailable(_) | ProxyError::UpstreamTimeout { .. } => {
            tracing::error!(
                request_id = %request_id,
                route = route.label(),
                error = %err,
                "Upstream request failed"
            );
            metrics::record_upstream_failure(route.label());
        }
        other => {
            tracing::warn!(
                request_id = %request_id,
                route = route.label(),
                error = %other,
                "Rejected request"
            );
        }
    }
    response::error(err, cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    fn server(allow_hosts: &[&str]) -> HttpServer {
        let mut config = ProxyConfig::default();
        // Discard port: nothing answers, so upstream calls fail fast.
        config.upstream.base_url = "http://127.0.0.1:9".into();
        config.access.allow_hosts = allow_hosts.iter().map(|h| h.to_string()).collect();
        HttpServer::new(config).unwrap()
    }

    fn request(method: Method, path: &str, host: &str, origin: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::HOST, host);
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn preflight_is_empty_204_with_cors() {
        let app = server(&[]).router();
        let response = app
            .oneshot(request(
                Method::OPTIONS,
                "/api/event",
                "analytics.example.com",
                Some("https://www.example.com"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://www.example.com"
        );
        assert!(response.headers().contains_key("x-request-id"));
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn unknown_path_is_404_with_cors() {
        let app = server(&[]).router();
        let response = app
            .oneshot(request(
                Method::GET,
                "/unknown-path",
                "analytics.example.com",
                Some("https://example.com"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://example.com"
        );
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Not found");
    }

    #[tokio::test]
    async fn foreign_origin_only_sees_vary() {
        let app = server(&[]).router();
        let response = app
            .oneshot(request(
                Method::OPTIONS,
                "/p.js",
                "analytics.example.com",
                Some("https://evil.example"),
            ))
            .await
            .unwrap();

        assert_eq!(response.headers()[header::VARY], "Origin");
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .is_none());
    }

    #[tokio::test]
    async fn host_outside_allowlist_is_forbidden() {
        let app = server(&["analytics.example.com"]).router();
        for method in [Method::OPTIONS, Method::GET, Method::POST] {
            let response = app
                .clone()
                .oneshot(request(
                    method,
                    "/p.js",
                    "analytics.evil.example",
                    Some("https://evil.example"),
                ))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            assert!(response.headers().get(header::VARY).is_none());
            let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn allowlisted_host_passes_gate() {
        let app = server(&["analytics.example.com", "analytics.other.com"]).router();
        let response = app
            .oneshot(request(Method::GET, "/nope", "analytics.other.com", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn host_case_and_default_port_are_ignored() {
        let app = server(&["analytics.example.com"]).router();
        let response = app
            .oneshot(request(
                Method::OPTIONS,
                "/api/event",
                "Analytics.Example.com:443",
                Some("https://example.com"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn unreachable_upstream_is_502() {
        let app = server(&[]).router();
        let response = app
            .oneshot(request(Method::GET, "/p.js", "analytics.example.com", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }
}
