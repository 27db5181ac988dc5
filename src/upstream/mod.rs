//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! GET  /p.js       → forwarder.rs → GET  <upstream>/js/plausible.js
//! POST /api/event  → forwarder.rs → POST <upstream>/api/event (body pass-through)
//!     ← status + streaming body (upstream headers dropped)
//! ```
//!
//! # Design Decisions
//! - No retries: one attempt, failures go straight back to the caller
//! - Response bodies stream through without buffering
//! - Dropping the handler future (client gone) drops the outbound call

pub mod forwarder;

pub use forwarder::{Forwarder, UpstreamResponse};
