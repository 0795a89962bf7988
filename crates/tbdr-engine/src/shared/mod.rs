//! Data layouts shared between host code and the WGSL shaders.
//!
//! Every type here is `#[repr(C)]` + `Pod` and has a byte-for-byte mirror in
//! `blend/shaders/shared.wgsl`. Field order and widths must agree on both
//! sides; the layout is pinned by compile-time assertions and unit tests.

mod tiled;
mod vertex;

pub use tiled::{TileError, TileGrid, TileIndex, TiledComputeBlendParams, TILE_COUNT};
pub use vertex::Vertex;
