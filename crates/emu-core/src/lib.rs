//! Core traits and types for tick-driven device emulation.
//!
//! Everything ticks at the master clock frequency. Frame pacing, timers
//! and sleep periods are all expressed in master ticks so a run is fully
//! reproducible from its inputs.

mod clock;
mod machine;
mod observable;
mod tickable;
mod ticks;

pub use clock::MasterClock;
pub use machine::{Machine, VideoConfig};
pub use observable::{Observable, Value};
pub use tickable::Tickable;
pub use ticks::Ticks;
