use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

/// Pass-through geometry vertex.
///
/// `position` is in pixels and becomes the rasterizer position once the
/// vertex stage maps it to clip space. `tex_coord` uses a top-left origin,
/// so the bottom edge of the image carries `v = 1`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 4],
    pub tex_coord: [f32; 2],
    // vec4<f32> aligns the WGSL struct to 16 bytes.
    _pad: [f32; 2],
}

const_assert_eq!(core::mem::size_of::<Vertex>(), 32);

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x4, // position
        1 => Float32x2  // tex_coord
    ];

    #[inline]
    pub const fn new(position: [f32; 4], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            tex_coord,
            _pad: [0.0; 2],
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: core::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    /// Triangle strip covering a `width` x `height` image anchored at the
    /// bottom-left pixel corner.
    pub fn quad(width: f32, height: f32) -> [Vertex; 4] {
        [
            Vertex::new([0.0, 0.0, 0.0, 1.0], [0.0, 1.0]),
            Vertex::new([width, 0.0, 0.0, 1.0], [1.0, 1.0]),
            Vertex::new([0.0, height, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([width, height, 0.0, 1.0], [1.0, 0.0]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_wgsl_struct() {
        assert_eq!(core::mem::size_of::<Vertex>(), 32);
        assert_eq!(Vertex::layout().array_stride, 32);
        assert_eq!(core::mem::offset_of!(Vertex, position), 0);
        assert_eq!(core::mem::offset_of!(Vertex, tex_coord), 16);
    }

    #[test]
    fn bytes_follow_field_order() {
        let v = Vertex::new([1.0, 2.0, 3.0, 4.0], [5.0, 6.0]);
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&v));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 0.0, 0.0]);
    }

    #[test]
    fn quad_corners_and_tex_coords() {
        let q = Vertex::quad(40.0, 20.0);
        assert_eq!(q[0].position, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(q[3].position, [40.0, 20.0, 0.0, 1.0]);
        // Bottom edge samples the last texture row.
        assert_eq!(q[0].tex_coord, [0.0, 1.0]);
        assert_eq!(q[2].tex_coord, [0.0, 0.0]);
        assert_eq!(q[3].tex_coord, [1.0, 0.0]);
    }
}
