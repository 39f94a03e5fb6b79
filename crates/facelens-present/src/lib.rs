//! facelens Presentation - what the screen should show, derived from events
//!
//! Engine → Event Contract → `reduce` → DisplayState → Rendering Adapter
//!
//! The reducer is a pure function: no I/O, no locking, no clocks. It is total
//! over the event vocabulary, including every error case, and it never
//! panics on engine output. Each call yields the next DisplayState plus one
//! diagnostic record for the observability sink.

pub mod display;
pub mod format;
pub mod reducer;
pub mod table;

pub use display::*;
pub use format::*;
pub use reducer::*;
pub use table::*;
