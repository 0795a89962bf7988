use std::path::PathBuf;

use crate::blend::BlendStrategy;
use crate::schedule::ScheduleMode;

/// Benchmark configuration.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Working image size in pixels. Must be even on both axes for the
    /// tiled strategy.
    pub width: u32,
    pub height: u32,

    /// Number of layers to composite (at least 2).
    pub layer_count: usize,

    /// Frames to render after one warm-up frame.
    pub frames: usize,

    pub strategy: BlendStrategy,
    pub schedule: ScheduleMode,

    /// Output targets in rotation, and the in-flight bound in unconstrained
    /// mode.
    pub max_frames_in_flight: usize,

    /// Load `block_{i}.png` layers from here instead of generating them.
    pub layers_dir: Option<PathBuf>,

    /// Write the last frame here.
    pub output_png: Option<PathBuf>,

    /// Compare the last frame against the CPU reference.
    pub verify: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            width: 4000,
            height: 2000,
            layer_count: 50,
            frames: 60,
            strategy: BlendStrategy::ComputeTiled,
            schedule: ScheduleMode::Unconstrained,
            max_frames_in_flight: 2,
            layers_dir: None,
            output_png: None,
            verify: false,
        }
    }
}
