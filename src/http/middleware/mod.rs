//! Request middleware.

pub mod access_control;

pub use access_control::host_allowlist_middleware;
