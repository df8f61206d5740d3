//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, one task per connection)
//!     → target.rs (upstream base + inbound path/query → target URI, Host)
//!     → client.rs (plain or TLS transport chosen by scheme)
//!     → server.rs (status + headers copied, body streamed back)
//!     → response.rs (transport failure → 502 Bad Gateway)
//! ```

pub mod client;
pub mod response;
pub mod server;
pub mod target;

pub use response::{bad_gateway, RelayError, BAD_GATEWAY_PREFIX};
pub use server::{Relay, RelayServer};
pub use target::{TargetError, TargetUrl, Upstream};
