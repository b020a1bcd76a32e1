//! LLM gateway module
//!
//! The request pipeline: auth check, body rewrite against the routing table,
//! upstream dispatch, response relay.

pub mod auth;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod relay;
pub mod rewrite;
pub mod server;

pub use error::ProxyError;
pub use handlers::GatewayState;
