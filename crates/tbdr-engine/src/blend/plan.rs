//! GPU-free description of the blend passes each strategy encodes.

use crate::shared::{TileGrid, TileIndex, TiledComputeBlendParams};

use super::BlendError;

/// Where a step reads its lower operand from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Source {
    Layer(usize),
    /// Ping-pong slot written by the previous step.
    Intermediate(usize),
}

/// Where a step writes its result.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Dest {
    Intermediate(usize),
    Output,
}

/// `dst = layer[src2] over src1`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlendStep {
    pub src1: Source,
    pub src2: usize,
    pub dst: Dest,
}

/// Bottom-to-top fold of a layer stack, alternating between two
/// intermediates because a pass may not read the texture it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlendPlan {
    steps: Vec<BlendStep>,
}

impl BlendPlan {
    pub const INTERMEDIATE_SLOTS: usize = 2;

    pub fn new(layer_count: usize) -> Result<Self, BlendError> {
        if layer_count < 2 {
            return Err(BlendError::TooFewLayers(layer_count));
        }
        let last = layer_count - 2;
        let steps = (0..=last)
            .map(|k| BlendStep {
                src1: if k == 0 {
                    Source::Layer(0)
                } else {
                    Source::Intermediate((k - 1) % Self::INTERMEDIATE_SLOTS)
                },
                src2: k + 1,
                dst: if k == last {
                    Dest::Output
                } else {
                    Dest::Intermediate(k % Self::INTERMEDIATE_SLOTS)
                },
            })
            .collect();
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[BlendStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// A `BlendStep` restricted to one tile of the 2x2 grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TiledStep {
    pub tile: TileIndex,
    pub step: BlendStep,
    pub params: TiledComputeBlendParams,
}

/// Per-tile expansion of a `BlendPlan`.
///
/// Intermediates are tile-sized, so they are always addressed as tile 0.
/// Full-size layers are addressed by the tile being processed, and the
/// final pass writes each tile into its own quadrant of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiledPlan {
    grid: TileGrid,
    steps: Vec<TiledStep>,
}

impl TiledPlan {
    pub fn new(layer_count: usize, grid: TileGrid) -> Result<Self, BlendError> {
        let plan = BlendPlan::new(layer_count)?;
        let mut steps = Vec::with_capacity(plan.len() * crate::shared::TILE_COUNT);

        for step in plan.steps() {
            for tile in grid.tiles() {
                let src1 = match step.src1 {
                    Source::Layer(_) => tile,
                    Source::Intermediate(_) => TileIndex::TOP_LEFT,
                };
                let dst = match step.dst {
                    Dest::Intermediate(_) => TileIndex::TOP_LEFT,
                    Dest::Output => tile,
                };
                steps.push(TiledStep {
                    tile,
                    step: *step,
                    params: grid.params(src1, tile, dst),
                });
            }
        }

        Ok(Self { grid, steps })
    }

    pub fn grid(&self) -> TileGrid {
        self.grid
    }

    pub fn steps(&self) -> &[TiledStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── BlendPlan ─────────────────────────────────────────────────────────

    #[test]
    fn rejects_fewer_than_two_layers() {
        assert!(matches!(BlendPlan::new(1), Err(BlendError::TooFewLayers(1))));
        assert!(matches!(BlendPlan::new(0), Err(BlendError::TooFewLayers(0))));
    }

    #[test]
    fn two_layers_write_output_directly() {
        let plan = BlendPlan::new(2).unwrap();
        assert_eq!(
            plan.steps(),
            &[BlendStep {
                src1: Source::Layer(0),
                src2: 1,
                dst: Dest::Output,
            }]
        );
    }

    #[test]
    fn intermediates_ping_pong() {
        let plan = BlendPlan::new(5).unwrap();
        let s = plan.steps();
        assert_eq!(s.len(), 4);
        assert_eq!(s[0].dst, Dest::Intermediate(0));
        assert_eq!(s[1].src1, Source::Intermediate(0));
        assert_eq!(s[1].dst, Dest::Intermediate(1));
        assert_eq!(s[2].src1, Source::Intermediate(1));
        assert_eq!(s[2].dst, Dest::Intermediate(0));
        assert_eq!(s[3].src1, Source::Intermediate(0));
        assert_eq!(s[3].dst, Dest::Output);
        // Never read and write the same slot in one step.
        for step in s {
            if let (Source::Intermediate(r), Dest::Intermediate(w)) = (step.src1, step.dst) {
                assert_ne!(r, w);
            }
        }
        let layers: Vec<usize> = s.iter().map(|st| st.src2).collect();
        assert_eq!(layers, vec![1, 2, 3, 4]);
    }

    // ── TiledPlan ─────────────────────────────────────────────────────────

    #[test]
    fn tiled_first_pass_reads_full_layers() {
        let grid = TileGrid::new(40, 20).unwrap();
        let plan = TiledPlan::new(3, grid).unwrap();
        assert_eq!(plan.len(), 8);

        for (t, step) in plan.steps()[..4].iter().enumerate() {
            assert_eq!(step.tile.get() as usize, t);
            assert_eq!(step.params.src1_tile_index(), step.tile);
            assert_eq!(step.params.src2_tile_index(), step.tile);
            assert_eq!(step.params.dst_tile_index(), TileIndex::TOP_LEFT);
            assert_eq!(step.params.dst_start_position(), [0, 0]);
        }
    }

    #[test]
    fn tiled_final_pass_writes_each_quadrant() {
        let grid = TileGrid::new(40, 20).unwrap();
        let plan = TiledPlan::new(3, grid).unwrap();

        let starts: Vec<[u16; 2]> = plan.steps()[4..]
            .iter()
            .map(|s| {
                assert_eq!(s.step.dst, Dest::Output);
                assert_eq!(s.params.src1_tile_index(), TileIndex::TOP_LEFT);
                s.params.dst_start_position()
            })
            .collect();
        assert_eq!(starts, vec![[0, 0], [20, 0], [0, 10], [20, 10]]);
    }
}
