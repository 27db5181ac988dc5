//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → middleware/ (host allowlist gate)
//!     → routing (classify method + path)
//!     → upstream forwarder (script / event routes only)
//!     → response.rs (status + body, merged CORS and security headers)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{request_host, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
