//! Response assembly.
//!
//! # Responsibilities
//! - Turn an upstream status + body into the client response
//! - Force the per-route content type and cache policy
//! - Merge CORS and security headers in a fixed order
//! - Render `ProxyError`s with the headers each one is entitled to
//!
//! # Design Decisions
//! - Upstream response headers are never copied
//! - Header layers: route → CORS → security; security is applied last
//! - Bodies stream through untouched

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::ProxyError;
use crate::security::{merge_headers, security_headers};
use crate::upstream::UpstreamResponse;

pub const SCRIPT_CONTENT_TYPE: &str = "application/javascript; charset=utf-8";
pub const SCRIPT_CACHE_CONTROL: &str = "public, max-age=3600";

pub const EVENT_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const EVENT_CACHE_CONTROL: &str = "no-store";

/// Empty 204 answer to a CORS preflight.
pub fn preflight(cors: HeaderMap) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    merge_headers(response.headers_mut(), [cors]);
    response
}

/// Client response for the proxied script.
pub fn script(upstream: UpstreamResponse, cors: HeaderMap) -> Response {
    proxied(
        upstream,
        route_headers(SCRIPT_CONTENT_TYPE, SCRIPT_CACHE_CONTROL),
        cors,
    )
}

/// Client response for a forwarded event.
pub fn event(upstream: UpstreamResponse, cors: HeaderMap) -> Response {
    proxied(
        upstream,
        route_headers(EVENT_CONTENT_TYPE, EVENT_CACHE_CONTROL),
        cors,
    )
}

/// Render an error, attaching CORS and security headers where allowed.
pub fn error(err: ProxyError, cors: HeaderMap) -> Response {
    let mut layers = Vec::with_capacity(2);
    if err.exposes_cors() {
        layers.push(cors);
    }
    if err.carries_security_headers() {
        layers.push(security_headers());
    }

    let mut response = err.into_response();
    merge_headers(response.headers_mut(), layers);
    response
}

fn proxied(upstream: UpstreamResponse, route: HeaderMap, cors: HeaderMap) -> Response {
    let mut response = Response::new(upstream.body);
    *response.status_mut() = upstream.status;
    merge_headers(response.headers_mut(), [route, cors, security_headers()]);
    response
}

fn route_headers(content_type: &'static str, cache_control: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(2);
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));
    headers
}
