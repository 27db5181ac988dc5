//! Host allowlist middleware.
//! Runs ahead of routing; rejected requests never reach a handler.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::{request_host, request_id};
use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn host_allowlist_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    // Passthrough mode when no allowlist is configured.
    if state.allowlist.is_unrestricted() {
        return next.run(request).await;
    }

    let host = request_host(request.headers(), request.uri());

    match state.allowlist.check(host.as_deref()) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::warn!(
                request_id = %request_id(request.headers()),
                host = ?host,
                "Host not in allowlist"
            );
            metrics::record_forbidden();
            err.into_response()
        }
    }
}
