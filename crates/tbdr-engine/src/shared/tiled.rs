use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use thiserror::Error;

/// Number of tiles in the implicit 2x2 grid.
pub const TILE_COUNT: usize = 4;

/// Errors produced while building tile descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileError {
    #[error("tile index {0} is outside the 2x2 grid (expected 0..=3)")]
    IndexOutOfRange(usize),

    #[error("tile size {width}x{height} does not fit in 16 bits")]
    TileTooLarge { width: u32, height: u32 },

    #[error("working size {width}x{height} cannot be split into 2x2 tiles")]
    OddWorkingSize { width: u32, height: u32 },
}

/// Position in the 2x2 tile grid: column = `index % 2`, row = `index / 2`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex(u16);

impl TileIndex {
    pub const TOP_LEFT: TileIndex = TileIndex(0);

    pub const fn new(index: u16) -> Result<Self, TileError> {
        if index < TILE_COUNT as u16 {
            Ok(Self(index))
        } else {
            Err(TileError::IndexOutOfRange(index as usize))
        }
    }

    #[inline]
    pub const fn get(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn column(self) -> u16 {
        self.0 % 2
    }

    #[inline]
    pub const fn row(self) -> u16 {
        self.0 / 2
    }

    /// Pixel-space origin of this tile.
    #[inline]
    pub const fn start_position(self, tile_width: u16, tile_height: u16) -> [u16; 2] {
        start_position(self.0, tile_width, tile_height)
    }

    /// All four tiles in index order.
    pub fn all() -> impl Iterator<Item = TileIndex> {
        (0..TILE_COUNT as u16).map(TileIndex)
    }
}

impl TryFrom<usize> for TileIndex {
    type Error = TileError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if value < TILE_COUNT {
            Ok(TileIndex(value as u16))
        } else {
            Err(TileError::IndexOutOfRange(value))
        }
    }
}

/// Wraps on overflow, matching 16-bit shader arithmetic for indices outside
/// the grid (reachable through `Pod` casts).
#[inline]
const fn start_position(index: u16, tile_width: u16, tile_height: u16) -> [u16; 2] {
    [
        (index % 2).wrapping_mul(tile_width),
        (index / 2).wrapping_mul(tile_height),
    ]
}

/// Per-dispatch parameters of the tiled compute blend kernel.
///
/// Two sources and one destination, each addressed as a tile of the 2x2
/// grid. The shader reads the struct as a `vec4<u32>` uniform and splits it
/// into little-endian 16-bit halves, so the trailing padding keeps the
/// binding at the 16-byte minimum.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct TiledComputeBlendParams {
    src1_tile_index: u16,
    src2_tile_index: u16,
    dst_tile_index: u16,
    tile_width: u16,
    tile_height: u16,
    _pad: [u16; 3],
}

const_assert_eq!(core::mem::size_of::<TiledComputeBlendParams>(), 16);

impl TiledComputeBlendParams {
    pub const fn new(
        src1_tile_index: TileIndex,
        src2_tile_index: TileIndex,
        dst_tile_index: TileIndex,
        tile_width: u16,
        tile_height: u16,
    ) -> Self {
        Self {
            src1_tile_index: src1_tile_index.0,
            src2_tile_index: src2_tile_index.0,
            dst_tile_index: dst_tile_index.0,
            tile_width,
            tile_height,
            _pad: [0; 3],
        }
    }

    #[inline]
    pub const fn src1_tile_index(&self) -> TileIndex {
        TileIndex(self.src1_tile_index)
    }

    #[inline]
    pub const fn src2_tile_index(&self) -> TileIndex {
        TileIndex(self.src2_tile_index)
    }

    #[inline]
    pub const fn dst_tile_index(&self) -> TileIndex {
        TileIndex(self.dst_tile_index)
    }

    #[inline]
    pub const fn tile_width(&self) -> u16 {
        self.tile_width
    }

    #[inline]
    pub const fn tile_height(&self) -> u16 {
        self.tile_height
    }

    #[inline]
    pub const fn src1_start_position(&self) -> [u16; 2] {
        start_position(self.src1_tile_index, self.tile_width, self.tile_height)
    }

    #[inline]
    pub const fn src2_start_position(&self) -> [u16; 2] {
        start_position(self.src2_tile_index, self.tile_width, self.tile_height)
    }

    #[inline]
    pub const fn dst_start_position(&self) -> [u16; 2] {
        start_position(self.dst_tile_index, self.tile_width, self.tile_height)
    }
}

/// The implicit 2x2 grid over a working image.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TileGrid {
    tile_width: u16,
    tile_height: u16,
}

impl TileGrid {
    /// Splits a `width` x `height` working image into four equal tiles.
    ///
    /// Both dimensions must be even so the tiles cover the image exactly.
    pub fn new(width: u32, height: u32) -> Result<Self, TileError> {
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(TileError::OddWorkingSize { width, height });
        }
        let (w, h) = (width / 2, height / 2);
        match (u16::try_from(w), u16::try_from(h)) {
            (Ok(tile_width), Ok(tile_height)) => Ok(Self {
                tile_width,
                tile_height,
            }),
            _ => Err(TileError::TileTooLarge {
                width: w,
                height: h,
            }),
        }
    }

    #[inline]
    pub const fn tile_size(&self) -> (u16, u16) {
        (self.tile_width, self.tile_height)
    }

    #[inline]
    pub const fn working_size(&self) -> (u32, u32) {
        (self.tile_width as u32 * 2, self.tile_height as u32 * 2)
    }

    pub fn tiles(&self) -> impl Iterator<Item = TileIndex> {
        TileIndex::all()
    }

    pub const fn params(
        &self,
        src1: TileIndex,
        src2: TileIndex,
        dst: TileIndex,
    ) -> TiledComputeBlendParams {
        TiledComputeBlendParams::new(src1, src2, dst, self.tile_width, self.tile_height)
    }
}
