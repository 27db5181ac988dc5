//! Request routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (after the host allowlist gate)
//!     → router.rs classifies method + path
//!     → Preflight | Script | Event | NotFound
//!     → http server dispatches to the matching handler
//! ```
//!
//! # Design Decisions
//! - Fixed priority order, first match wins
//! - No state is retained between requests

pub mod router;

pub use router::{Route, EVENT_PATH, SCRIPT_PATH};
