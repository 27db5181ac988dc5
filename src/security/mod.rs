//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (host allowlist gate)
//!     → Pass to routing
//!
//! Outgoing response:
//!     → cors.rs (origin-dependent Access-Control-* headers)
//!     → headers.rs (fixed security headers, merged last)
//! ```
//!
//! # Design Decisions
//! - Allowlist rejections are opaque: no body, no CORS headers
//! - CORS never blocks delivery, only the page's ability to read
//! - No trust in client input

pub mod access_control;
pub mod cors;
pub mod headers;

pub use access_control::HostAllowlist;
pub use cors::CorsPolicy;
pub use headers::{merge_headers, security_headers};
