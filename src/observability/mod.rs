//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! main
//!     → logging.rs (subscriber: EnvFilter + fmt layer)
//!
//! Relay (when traffic logging is enabled):
//!     → traffic.rs (request line + headers, capped bodies, response status)
//! ```
//!
//! # Design Decisions
//! - Structured logging through the tracing crate
//! - Traffic logging is opt-in and never touches forwarded bytes
//! - No metrics endpoint

pub mod logging;
pub mod traffic;

pub use traffic::TrafficLogger;
