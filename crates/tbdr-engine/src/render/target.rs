/// Format of intermediate blend results (linear, straight alpha).
pub const INTERMEDIATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Format of final outputs. sRGB formats cannot be storage textures, so the
/// shaders encode sRGB themselves and write plain unorm.
pub const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A texture usable both as a render attachment and as a storage image.
pub struct Target {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Target {
    fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        extra_usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | extra_usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    pub fn intermediate(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        Self::new(
            device,
            label,
            width,
            height,
            INTERMEDIATE_FORMAT,
            wgpu::TextureUsages::empty(),
        )
    }

    pub fn output(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        Self::new(
            device,
            label,
            width,
            height,
            OUTPUT_FORMAT,
            wgpu::TextureUsages::COPY_SRC,
        )
    }

    #[inline]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// Round-robin pool of output targets, one per frame in flight.
pub struct OutputRing {
    targets: Vec<Target>,
    next: usize,
}

impl OutputRing {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, count: usize) -> Self {
        let targets = (0..count.max(1))
            .map(|i| Target::output(device, &format!("tbdr output #{i}"), width, height))
            .collect();
        Self { targets, next: 0 }
    }

    /// Returns the next output in rotation.
    pub fn acquire(&mut self) -> &Target {
        let slot = self.next;
        self.next = (self.next + 1) % self.targets.len();
        &self.targets[slot]
    }

    /// The output handed out by the most recent `acquire`.
    pub fn last(&self) -> &Target {
        let len = self.targets.len();
        &self.targets[(self.next + len - 1) % len]
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
