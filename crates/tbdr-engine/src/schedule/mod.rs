//! Command submission scheduling.
//!
//! Controls how much consecutive frames may overlap on the GPU.

mod scheduler;

pub use scheduler::{CommandScheduler, ScheduleMode};
