use image::{Rgba, RgbaImage};

use super::{LayerError, LayerSet};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Square block placement shared by every generated layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct BlockLayout {
    pub block_size: u32,
    pub blocks_per_line: u32,
}

impl BlockLayout {
    /// Splits `width * height` pixels evenly across `count` square blocks.
    pub(crate) fn new(width: u32, height: u32, count: usize) -> Self {
        let pixels_per_block = (u64::from(width) * u64::from(height)) / count.max(1) as u64;
        let block_size = ((pixels_per_block as f64).sqrt().floor() as u32).clamp(1, width.max(1));
        Self {
            block_size,
            blocks_per_line: (width / block_size).max(1),
        }
    }

    /// Top-left pixel of the block owned by layer `index`.
    pub(crate) fn origin(&self, index: usize) -> (u32, u32) {
        let index = index as u32;
        (
            (index % self.blocks_per_line) * self.block_size,
            (index / self.blocks_per_line) * self.block_size,
        )
    }
}

fn pattern(x: u32, y: u32) -> Rgba<u8> {
    match (x % 8 < 4, y % 8 < 4) {
        (true, true) => RED,
        (true, false) => GREEN,
        (false, false) => BLUE,
        (false, true) => CLEAR,
    }
}

impl LayerSet {
    /// Generates `count` layers of `width` x `height`.
    ///
    /// Each layer is transparent apart from one patterned square, and the
    /// squares of successive layers tile the image left to right, top to
    /// bottom, so the composite shows every layer.
    pub fn generate(width: u32, height: u32, count: usize) -> Result<Self, LayerError> {
        if count == 0 {
            return Err(LayerError::Empty);
        }
        if width == 0 || height == 0 {
            return Err(LayerError::InvalidSize { width, height });
        }

        let layout = BlockLayout::new(width, height, count);
        log::debug!(
            "generating {count} layers of {width}x{height}, block {}px",
            layout.block_size
        );

        let images = (0..count)
            .map(|i| {
                let (x0, y0) = layout.origin(i);
                let (x1, y1) = (x0 + layout.block_size, y0 + layout.block_size);
                RgbaImage::from_fn(width, height, |x, y| {
                    if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                        pattern(x, y)
                    } else {
                        CLEAR
                    }
                })
            })
            .collect();

        LayerSet::from_images(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_layout_for_default_bench() {
        let layout = BlockLayout::new(4000, 2000, 50);
        // 160_000 px per block -> 400px squares, 10 per line.
        assert_eq!(layout.block_size, 400);
        assert_eq!(layout.blocks_per_line, 10);
        assert_eq!(layout.origin(0), (0, 0));
        assert_eq!(layout.origin(9), (3600, 0));
        assert_eq!(layout.origin(10), (0, 400));
        assert_eq!(layout.origin(49), (3600, 1600));
    }

    #[test]
    fn pattern_quadrants() {
        assert_eq!(pattern(0, 0), RED);
        assert_eq!(pattern(3, 7), GREEN);
        assert_eq!(pattern(4, 4), BLUE);
        assert_eq!(pattern(7, 0), CLEAR);
        assert_eq!(pattern(8, 8), RED);
    }

    #[test]
    fn generated_layer_has_single_block() {
        let set = LayerSet::generate(32, 16, 8).unwrap();
        assert_eq!(set.len(), 8);
        // 64 px per block -> 8px squares, 4 per line.
        let layer = set.get(5).unwrap();
        assert_eq!(*layer.get_pixel(8, 8), RED);
        assert_eq!(*layer.get_pixel(12, 12), BLUE);
        assert_eq!(*layer.get_pixel(0, 0), CLEAR);
        assert_eq!(*layer.get_pixel(16, 8), CLEAR);
    }

    #[test]
    fn rejects_empty_and_zero_size() {
        assert!(matches!(LayerSet::generate(8, 8, 0), Err(LayerError::Empty)));
        assert!(matches!(
            LayerSet::generate(0, 8, 2),
            Err(LayerError::InvalidSize { .. })
        ));
    }
}
