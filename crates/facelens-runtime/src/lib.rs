//! facelens Runtime - hosting a session on tokio
//!
//! - `config`: JSON runtime configuration with human-readable durations
//! - `host`: the async loop feeding license signals, host commands and the
//!   idle clock into a [`SessionController`](facelens_session::SessionController)
//! - `telemetry`: tracing subscriber setup

pub mod config;
pub mod host;
pub mod telemetry;

pub use config::*;
pub use host::*;
