//! Transparent HTTP forwarding relay.
//!
//! Every inbound request is re-issued against one fixed upstream origin and
//! the upstream's response is streamed back unchanged. Transport failures on
//! the upstream leg become `502 Bad Gateway`.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::RelayConfig;
pub use http::{Relay, RelayServer};
pub use lifecycle::Shutdown;
