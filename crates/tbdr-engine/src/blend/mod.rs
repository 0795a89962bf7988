//! Layer blending strategies.
//!
//! Every strategy composites the same layer stack bottom to top with
//! straight-alpha "source over" and writes the sRGB-encoded result into an
//! output target. They differ only in how the work is split into GPU passes:
//!
//! - `Render`: one render pass per layer, drawing a full-image strip
//! - `Compute`: one dispatch per layer
//! - `ComputeTiled`: one dispatch per layer per tile of a 2x2 grid
//! - `ComputeMonolithic`: a single dispatch reading every layer

mod common;
mod compute;
mod compute_monolithic;
mod compute_tiled;
mod plan;
mod render;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::layers::{GpuLayers, LayerError};
use crate::render::{RenderCtx, Target};
use crate::shared::TileError;

pub use compute::ComputeBlender;
pub use compute_monolithic::MonolithicBlender;
pub use compute_tiled::TiledComputeBlender;
pub use plan::{BlendPlan, BlendStep, Dest, Source, TiledPlan, TiledStep};
pub use render::RenderBlender;

/// Errors produced while building or encoding a blend.
#[derive(Debug, Error)]
pub enum BlendError {
    #[error("blending needs at least 2 layers, got {0}")]
    TooFewLayers(usize),

    #[error(transparent)]
    Layers(#[from] LayerError),

    #[error(transparent)]
    Tile(#[from] TileError),

    #[error("output target is {actual:?}, blender was built for {expected:?}")]
    OutputSizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// The available ways of splitting the blend into GPU work.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BlendStrategy {
    Render,
    Compute,
    ComputeTiled,
    ComputeMonolithic,
}

impl BlendStrategy {
    pub const ALL: [BlendStrategy; 4] = [
        BlendStrategy::Render,
        BlendStrategy::Compute,
        BlendStrategy::ComputeTiled,
        BlendStrategy::ComputeMonolithic,
    ];

    /// Command-line name.
    pub fn name(self) -> &'static str {
        match self {
            BlendStrategy::Render => "render",
            BlendStrategy::Compute => "compute",
            BlendStrategy::ComputeTiled => "compute-tiled",
            BlendStrategy::ComputeMonolithic => "compute-monolithic",
        }
    }

    /// Human-readable description for reports.
    pub fn label(self) -> &'static str {
        match self {
            BlendStrategy::Render => "Render (1 pass/layer)",
            BlendStrategy::Compute => "Compute (1 dispatch/layer)",
            BlendStrategy::ComputeTiled => "Compute (1 dispatch/layer, 4 tiles)",
            BlendStrategy::ComputeMonolithic => "Compute (1 dispatch, monolithic kernel)",
        }
    }

    /// Dispatches or draws encoded per frame for `layer_count` layers.
    pub fn calls_per_frame(self, layer_count: usize) -> usize {
        let steps = layer_count.saturating_sub(1);
        match self {
            BlendStrategy::Render | BlendStrategy::Compute => steps,
            BlendStrategy::ComputeTiled => steps * crate::shared::TILE_COUNT,
            BlendStrategy::ComputeMonolithic => usize::from(layer_count >= 2),
        }
    }
}

impl fmt::Display for BlendStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlendStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlendStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = BlendStrategy::ALL.iter().map(|b| b.name()).collect();
                format!("unknown strategy {s:?} (expected one of {})", names.join(", "))
            })
    }
}

/// A strategy ready to encode frames.
pub trait Blender {
    fn strategy(&self) -> BlendStrategy;

    /// Records one full composite of the layer stack into `output`.
    ///
    /// Returns the number of dispatches/draws recorded.
    fn encode(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        output: &Target,
    ) -> Result<u32, BlendError>;
}

/// Builds the blender for `strategy` over `layers`.
pub fn create_blender(
    strategy: BlendStrategy,
    ctx: &RenderCtx<'_>,
    layers: &GpuLayers,
) -> Result<Box<dyn Blender>, BlendError> {
    log::debug!("building {} blender for {} layers", strategy, layers.len());
    Ok(match strategy {
        BlendStrategy::Render => Box::new(RenderBlender::new(ctx, layers)?),
        BlendStrategy::Compute => Box::new(ComputeBlender::new(ctx, layers)?),
        BlendStrategy::ComputeTiled => Box::new(TiledComputeBlender::new(ctx, layers)?),
        BlendStrategy::ComputeMonolithic => Box::new(MonolithicBlender::new(ctx, layers)?),
    })
}

pub(crate) fn check_output(expected: (u32, u32), output: &Target) -> Result<(), BlendError> {
    let actual = output.size();
    if actual == expected {
        Ok(())
    } else {
        Err(BlendError::OutputSizeMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_round_trip() {
        for s in BlendStrategy::ALL {
            assert_eq!(s.name().parse::<BlendStrategy>(), Ok(s));
        }
        let err = "tiles".parse::<BlendStrategy>().unwrap_err();
        assert!(err.contains("compute-tiled"));
    }

    #[test]
    fn calls_per_frame() {
        assert_eq!(BlendStrategy::Render.calls_per_frame(50), 49);
        assert_eq!(BlendStrategy::Compute.calls_per_frame(50), 49);
        assert_eq!(BlendStrategy::ComputeTiled.calls_per_frame(50), 196);
        assert_eq!(BlendStrategy::ComputeMonolithic.calls_per_frame(50), 1);
        assert_eq!(BlendStrategy::ComputeMonolithic.calls_per_frame(1), 0);
    }
}
