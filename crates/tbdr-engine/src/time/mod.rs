//! Time subsystem.
//!
//! Frame timing for the benchmark loop:
//! - one `FrameClock` per run
//! - call `tick()` once per submitted frame and feed the result to `FrameStats`

mod frame_clock;
mod stats;

pub use frame_clock::{FrameClock, FrameTime};
pub use stats::FrameStats;
