//! Request classification.
//!
//! Checks run in a fixed priority order: any `OPTIONS` request is a
//! preflight regardless of path, then the two proxied endpoints, then the
//! not-found fallback. Classification is a pure function of method and path.

use axum::http::Method;

/// Path serving the client script.
pub const SCRIPT_PATH: &str = "/p.js";

/// Path accepting analytics events.
pub const EVENT_PATH: &str = "/api/event";

/// Where a request is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// CORS preflight, answered locally.
    Preflight,
    /// `GET /p.js`, proxied to the upstream script.
    Script,
    /// `POST /api/event`, proxied to the upstream event endpoint.
    Event,
    /// Anything else.
    NotFound,
}

impl Route {
    pub fn classify(method: &Method, path: &str) -> Self {
        if *method == Method::OPTIONS {
            Route::Preflight
        } else if *method == Method::GET && path == SCRIPT_PATH {
            Route::Script
        } else if *method == Method::POST && path == EVENT_PATH {
            Route::Event
        } else {
            Route::NotFound
        }
    }

    /// Stable label for logs and metrics.
    pub fn label(self) -> &'static str {
        match self {
            Route::Preflight => "preflight",
            Route::Script => "script",
            Route::Event => "event",
            Route::NotFound => "not_found",
        }
    }
}
