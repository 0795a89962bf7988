//! TBDR engine crate.
//!
//! Owns the CPU/GPU shared layouts and the layer blending strategies that
//! exercise them, plus the headless GPU runtime used to benchmark those
//! strategies.

pub mod device;
pub mod logging;
pub mod shared;
pub mod time;

pub mod bench;
pub mod blend;
pub mod layers;
pub mod reference;
pub mod render;
pub mod schedule;
