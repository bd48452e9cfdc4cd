//! JSON-RPC API Layer
//!
//! Localhost admin and presence API for the Command Relay.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use rate_limiter::RateLimiter;
pub use server::{RpcServer, RpcServerConfig};
