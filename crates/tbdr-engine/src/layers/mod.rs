//! Image layers fed to the blend strategies.
//!
//! Layers are straight-alpha sRGB RGBA8 images of one shared size. They are
//! either generated procedurally or loaded from `block_{i}.png` files, then
//! uploaded as one 2D texture per layer.

mod generate;
mod io;
mod upload;

use image::RgbaImage;
use thiserror::Error;

pub use upload::{GpuLayers, LayerArray};

/// Errors produced while building or loading layers.
#[derive(Debug, Error)]
pub enum LayerError {
    #[error("at least one layer is required")]
    Empty,

    #[error("layer size {width}x{height} is invalid")]
    InvalidSize { width: u32, height: u32 },

    #[error("layer {index} is {actual:?}, expected {expected:?}")]
    SizeMismatch {
        index: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("layer size {width}x{height} exceeds the device limit of {limit}")]
    TooLarge { width: u32, height: u32, limit: u32 },

    #[error("{count} layers exceed the device limit of {limit} texture array layers")]
    TooManyLayers { count: usize, limit: u32 },

    #[error("failed to read or write layer image {}", path.display())]
    Image {
        path: std::path::PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// A stack of equally sized layers. Index 0 is the bottom of the stack.
#[derive(Debug, Clone)]
pub struct LayerSet {
    width: u32,
    height: u32,
    images: Vec<RgbaImage>,
}

impl LayerSet {
    /// Builds a set from already decoded images.
    pub fn from_images(images: Vec<RgbaImage>) -> Result<Self, LayerError> {
        let first = images.first().ok_or(LayerError::Empty)?;
        let expected = first.dimensions();
        if expected.0 == 0 || expected.1 == 0 {
            return Err(LayerError::InvalidSize {
                width: expected.0,
                height: expected.1,
            });
        }
        for (index, img) in images.iter().enumerate() {
            if img.dimensions() != expected {
                return Err(LayerError::SizeMismatch {
                    index,
                    expected,
                    actual: img.dimensions(),
                });
            }
        }
        Ok(Self {
            width: expected.0,
            height: expected.1,
            images,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[RgbaImage] {
        &self.images
    }

    pub fn get(&self, index: usize) -> Option<&RgbaImage> {
        self.images.get(index)
    }
}
