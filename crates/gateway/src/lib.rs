//! LedgerQL gateway: configuration, logging and the HTTP server around the
//! GraphQL schema.

pub mod config;
pub mod logging;
pub mod server;

pub use crate::config::{CliOverrides, GatewayConfig, LogFormat};
pub use crate::server::{router, serve, AppState, TIMEOUT_CODE};
