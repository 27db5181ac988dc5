//! First-party analytics proxy library.
//!
//! Serves a hosted analytics collector from the site's own origin:
//! `GET /p.js` and `POST /api/event` are forwarded to a fixed upstream,
//! everything else is answered locally.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
