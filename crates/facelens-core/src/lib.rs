//! facelens Core - Fundamental types shared by every facelens crate
//!
//! This crate defines:
//! - The Event Contract (every analysis event the engine may emit)
//! - Session configuration ("Property") and the presentation profile
//! - Permission sets required by the host
//! - Session identifiers
//! - The error taxonomy

pub mod config;
pub mod error;
pub mod event;
pub mod id;
pub mod permission;

pub use config::*;
pub use error::*;
pub use event::*;
pub use id::*;
pub use permission::*;
