//! CPU reference compositor.
//!
//! Implements the exact math of the WGSL kernels so GPU output can be
//! verified, and replays the tiled plan on the CPU to check that the tile
//! start positions reassemble the full image.

use image::{Rgba, RgbaImage};

use crate::blend::{BlendError, BlendPlan, Dest, Source, TiledPlan};
use crate::layers::LayerSet;
use crate::shared::{TileGrid, TILE_COUNT};

type Linear = [f32; 4];

/// sRGB transfer function, decoding direction.
pub fn srgb_to_linear(v: u8) -> f32 {
    let c = f32::from(v) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// sRGB transfer function, encoding direction, rounded to 8 bits.
pub fn linear_to_srgb(c: f32) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let v = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (v * 255.0).round() as u8
}

/// Straight-alpha "source over": `src` lands on top of `dst`.
pub fn blend_over(dst: Linear, src: Linear) -> Linear {
    let a = src[3] + dst[3] * (1.0 - src[3]);
    if a <= 0.0 {
        return [0.0; 4];
    }
    let mix = |s: f32, d: f32| (s * src[3] + d * dst[3] * (1.0 - src[3])) / a;
    [mix(src[0], dst[0]), mix(src[1], dst[1]), mix(src[2], dst[2]), a]
}

struct Decoder {
    lut: [f32; 256],
}

impl Decoder {
    fn new() -> Self {
        let mut lut = [0.0; 256];
        for (i, v) in lut.iter_mut().enumerate() {
            *v = srgb_to_linear(i as u8);
        }
        Self { lut }
    }

    fn decode(&self, px: &Rgba<u8>) -> Linear {
        let [r, g, b, a] = px.0;
        [
            self.lut[usize::from(r)],
            self.lut[usize::from(g)],
            self.lut[usize::from(b)],
            f32::from(a) / 255.0,
        ]
    }
}

fn encode(c: Linear) -> Rgba<u8> {
    Rgba([
        linear_to_srgb(c[0]),
        linear_to_srgb(c[1]),
        linear_to_srgb(c[2]),
        (c[3].clamp(0.0, 1.0) * 255.0).round() as u8,
    ])
}

/// Composites the whole stack, bottom layer first.
pub fn composite(layers: &LayerSet) -> Result<RgbaImage, BlendError> {
    // Same preconditions as the GPU strategies.
    BlendPlan::new(layers.len())?;

    let decoder = Decoder::new();
    let images = layers.images();
    Ok(RgbaImage::from_fn(layers.width(), layers.height(), |x, y| {
        let acc = images[1..]
            .iter()
            .fold(decoder.decode(images[0].get_pixel(x, y)), |acc, img| {
                blend_over(acc, decoder.decode(img.get_pixel(x, y)))
            });
        encode(acc)
    }))
}

/// Composites by replaying the tiled compute plan step by step.
pub fn composite_tiled(layers: &LayerSet) -> Result<RgbaImage, BlendError> {
    let grid = TileGrid::new(layers.width(), layers.height())?;
    let plan = TiledPlan::new(layers.len(), grid)?;
    let (tw, th) = grid.tile_size();
    let (tw, th) = (u32::from(tw), u32::from(th));

    let decoder = Decoder::new();
    let tile_len = (tw * th) as usize;
    // [slot][tile] tile-sized linear buffers.
    let mut intermediates =
        vec![vec![vec![[0.0f32; 4]; tile_len]; TILE_COUNT]; BlendPlan::INTERMEDIATE_SLOTS];
    let mut output = RgbaImage::new(layers.width(), layers.height());

    for step in plan.steps() {
        let tile = usize::from(step.tile.get());
        let [s1x, s1y] = step.params.src1_start_position().map(u32::from);
        let [s2x, s2y] = step.params.src2_start_position().map(u32::from);
        let [dx, dy] = step.params.dst_start_position().map(u32::from);
        let above = &layers.images()[step.step.src2];

        let mut result = vec![[0.0f32; 4]; tile_len];
        for y in 0..th {
            for x in 0..tw {
                let below = match step.step.src1 {
                    Source::Layer(i) => decoder.decode(layers.images()[i].get_pixel(s1x + x, s1y + y)),
                    Source::Intermediate(slot) => {
                        // Intermediates are tile-sized and addressed as tile 0.
                        intermediates[slot][tile][((s1y + y) * tw + s1x + x) as usize]
                    }
                };
                let top = decoder.decode(above.get_pixel(s2x + x, s2y + y));
                result[(y * tw + x) as usize] = blend_over(below, top);
            }
        }

        match step.step.dst {
            Dest::Intermediate(slot) => {
                debug_assert_eq!((dx, dy), (0, 0));
                intermediates[slot][tile] = result;
            }
            Dest::Output => {
                for y in 0..th {
                    for x in 0..tw {
                        output.put_pixel(dx + x, dy + y, encode(result[(y * tw + x) as usize]));
                    }
                }
            }
        }
    }

    Ok(output)
}

/// Difference between two images of equal size.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ImageDiff {
    pub max_channel_delta: u8,
    pub mismatched_pixels: usize,
}

impl ImageDiff {
    /// True when no channel differs by more than `tolerance`.
    pub fn within(&self, tolerance: u8) -> bool {
        self.max_channel_delta <= tolerance
    }
}

/// Compares two images channel by channel. Fully transparent pixels compare
/// equal regardless of color.
pub fn compare(expected: &RgbaImage, actual: &RgbaImage) -> Option<ImageDiff> {
    if expected.dimensions() != actual.dimensions() {
        return None;
    }
    let mut diff = ImageDiff::default();
    for (e, a) in expected.pixels().zip(actual.pixels()) {
        if e.0[3] == 0 && a.0[3] == 0 {
            continue;
        }
        let delta = e
            .0
            .iter()
            .zip(a.0.iter())
            .map(|(x, y)| x.abs_diff(*y))
            .max()
            .unwrap_or(0);
        if delta > 0 {
            diff.mismatched_pixels += 1;
            diff.max_channel_delta = diff.max_channel_delta.max(delta);
        }
    }
    Some(diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Linear = [1.0, 0.0, 0.0, 1.0];
    const CLEAR: Linear = [0.0; 4];

    // ── blend math ────────────────────────────────────────────────────────

    #[test]
    fn opaque_source_replaces_destination() {
        assert_eq!(blend_over([0.0, 1.0, 0.0, 1.0], RED), RED);
    }

    #[test]
    fn transparent_source_keeps_destination() {
        assert_eq!(blend_over(RED, CLEAR), RED);
        assert_eq!(blend_over(CLEAR, CLEAR), CLEAR);
    }

    #[test]
    fn half_alpha_over_opaque() {
        let out = blend_over([0.0, 0.0, 1.0, 1.0], [1.0, 0.0, 0.0, 0.5]);
        assert_eq!(out, [0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn half_alpha_over_clear_keeps_color() {
        let out = blend_over(CLEAR, [0.2, 0.4, 0.6, 0.5]);
        assert_eq!(out, [0.2, 0.4, 0.6, 0.5]);
    }

    #[test]
    fn srgb_endpoints_are_exact() {
        for v in [0u8, 255] {
            assert_eq!(linear_to_srgb(srgb_to_linear(v)), v);
        }
        // Mid grey stays put through decode/encode.
        assert_eq!(linear_to_srgb(srgb_to_linear(128)), 128);
    }

    // ── compositing ───────────────────────────────────────────────────────

    #[test]
    fn composite_shows_every_block() {
        let layers = LayerSet::generate(32, 16, 8).unwrap();
        let out = composite(&layers).unwrap();
        // Layer 5 owns the block at (8, 8).
        assert_eq!(*out.get_pixel(8, 8), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.get_pixel(12, 12), Rgba([0, 0, 255, 255]));
        assert_eq!(*out.get_pixel(3, 4), Rgba([0, 255, 0, 255]));
        assert_eq!(out.get_pixel(4, 0).0[3], 0);
    }

    #[test]
    fn tiled_replay_matches_whole_image() {
        let layers = LayerSet::generate(48, 32, 6).unwrap();
        let whole = composite(&layers).unwrap();
        let tiled = composite_tiled(&layers).unwrap();
        assert_eq!(compare(&whole, &tiled), Some(ImageDiff::default()));
    }

    #[test]
    fn tiled_replay_with_two_layers() {
        let layers = LayerSet::generate(16, 16, 2).unwrap();
        let whole = composite(&layers).unwrap();
        let tiled = composite_tiled(&layers).unwrap();
        assert_eq!(whole, tiled);
    }

    #[test]
    fn single_layer_is_rejected() {
        let layers = LayerSet::generate(8, 8, 1).unwrap();
        assert!(matches!(composite(&layers), Err(BlendError::TooFewLayers(1))));
    }

    // ── compare ───────────────────────────────────────────────────────────

    #[test]
    fn compare_reports_max_delta() {
        let a = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let mut b = a.clone();
        b.put_pixel(1, 1, Rgba([13, 20, 30, 255]));
        let diff = compare(&a, &b).unwrap();
        assert_eq!(diff.max_channel_delta, 3);
        assert_eq!(diff.mismatched_pixels, 1);
        assert!(diff.within(3));
        assert!(!diff.within(2));
    }

    #[test]
    fn compare_ignores_color_under_zero_alpha() {
        let a = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
        let b = RgbaImage::from_pixel(1, 1, Rgba([9, 9, 9, 0]));
        assert_eq!(compare(&a, &b), Some(ImageDiff::default()));
        assert_eq!(compare(&a, &RgbaImage::new(2, 1)), None);
    }
}
