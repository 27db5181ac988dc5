//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → optional config file (TOML)
//!     → CLI flags / environment (UPSTREAM, ALLOW_HOSTS, BIND_ADDRESS)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to every request
//! ```
//!
//! # Design Decisions
//! - Config is read once at start-up; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigOverrides};
pub use schema::{
    AccessConfig, CorsConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig,
    SecurityConfig, TimeoutConfig, UpstreamConfig,
};
