//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file)
//!     → env.rs (process environment, then the .env file over it)
//!     → command-line overrides
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → passed by value into the relay at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults except the upstream base URL
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::EnvSource;
pub use loader::{read_config_file, resolve_config, ConfigError, Overrides};
pub use schema::{ListenerConfig, ObservabilityConfig, RelayConfig, TimeoutConfig, UpstreamConfig};
