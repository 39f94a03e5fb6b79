//! facelens Test Harness - collaborator doubles and session-level testing
//!
//! This crate provides:
//! - A scripted analysis engine with controllable license verdicts
//! - Recording renderer, observability sink and host surface
//! - A static permission authority
//! - A seeded event fuzzer for both presentation profiles
//! - Scenario helpers that run a controller end to end

pub mod engine;
pub mod fuzzer;
pub mod recording;
pub mod scenario;

pub use engine::*;
pub use fuzzer::*;
pub use recording::*;
pub use scenario::*;
