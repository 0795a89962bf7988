/// Device and queue handed to blend strategies while they build resources
/// and encode frames.
#[derive(Copy, Clone)]
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Stride between uniform records of `size` bytes addressed with dynamic
    /// offsets.
    pub fn uniform_stride(&self, size: u64) -> u32 {
        aligned_stride(size, self.device.limits().min_uniform_buffer_offset_alignment)
    }
}

fn aligned_stride(size: u64, alignment: u32) -> u32 {
    (size as u32).next_multiple_of(alignment.max(1))
}
