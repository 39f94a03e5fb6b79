//! facelens Session - lifecycle around the presentation reducer
//!
//! Unstarted → PermissionPending → Initializing → AwaitingLicense → Running → Stopped
//!
//! plus the absorbing `Rejected` phase when the license is invalid. The
//! controller owns the only live DisplayState of a session through a
//! [`Subscription`]; the engine only ever holds an [`EventSink`], which goes
//! dead the moment the session stops.

pub mod collaborators;
pub mod controller;
pub mod idle;
pub mod notice;
pub mod sink;
pub mod subscription;

pub use collaborators::*;
pub use controller::*;
pub use idle::*;
pub use notice::*;
pub use sink::*;
pub use subscription::*;
