//! Offscreen render targets.
//!
//! Blend strategies draw into `Target`s instead of a swapchain:
//! - intermediates are linear `Rgba16Float`
//! - outputs are `Rgba8Unorm` holding sRGB-encoded values, rotated through an
//!   `OutputRing` the way drawables are rotated by a presentation layer

mod ctx;
mod readback;
mod target;

pub use ctx::RenderCtx;
pub use readback::read_rgba8;
pub use target::{OutputRing, Target, INTERMEDIATE_FORMAT, OUTPUT_FORMAT};
