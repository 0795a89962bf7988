//! Shared GPU plumbing used by all blend strategies.

use crate::render::{INTERMEDIATE_FORMAT, OUTPUT_FORMAT};

/// Identical pipelines built per strategy. Rotating through them on every
/// dispatch/draw stands in for an app that switches blend modes per layer.
pub(super) const PIPELINE_VARIANTS: usize = 10;

/// Must match `@workgroup_size` in the compute kernels.
pub(super) const WORKGROUP_SIZE: u32 = 8;

const SHARED_WGSL: &str = include_str!("shaders/shared.wgsl");

/// Which kind of texture a pass writes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum TargetKind {
    Intermediate,
    Output,
}

impl TargetKind {
    pub(super) const ALL: [TargetKind; 2] = [TargetKind::Intermediate, TargetKind::Output];

    pub(super) fn format(self) -> wgpu::TextureFormat {
        match self {
            TargetKind::Intermediate => INTERMEDIATE_FORMAT,
            TargetKind::Output => OUTPUT_FORMAT,
        }
    }

    /// Position in `ALL`, for per-kind arrays.
    pub(super) fn index(self) -> usize {
        match self {
            TargetKind::Intermediate => 0,
            TargetKind::Output => 1,
        }
    }

    pub(super) fn name(self) -> &'static str {
        match self {
            TargetKind::Intermediate => "intermediate",
            TargetKind::Output => "output",
        }
    }

    fn prelude(self) -> &'static str {
        match self {
            TargetKind::Intermediate => concat!(
                "alias DstTexture = texture_storage_2d<rgba16float, write>;\n",
                "fn encode_output(c: vec4<f32>) -> vec4<f32> { return c; }\n",
            ),
            TargetKind::Output => concat!(
                "alias DstTexture = texture_storage_2d<rgba8unorm, write>;\n",
                "fn encode_output(c: vec4<f32>) -> vec4<f32> { return vec4<f32>(linear_to_srgb(c.rgb), c.a); }\n",
            ),
        }
    }
}

/// Per-target-kind pipeline sets, picked round-robin.
pub(super) struct Variants<P> {
    intermediate: Vec<P>,
    output: Vec<P>,
}

impl<P> Variants<P> {
    pub(super) fn build(count: usize, mut make: impl FnMut(TargetKind, usize) -> P) -> Self {
        Self {
            intermediate: (0..count).map(|i| make(TargetKind::Intermediate, i)).collect(),
            output: (0..count).map(|i| make(TargetKind::Output, i)).collect(),
        }
    }

    pub(super) fn pick(&self, kind: TargetKind, call: u32) -> &P {
        let set = match kind {
            TargetKind::Intermediate => &self.intermediate,
            TargetKind::Output => &self.output,
        };
        &set[call as usize % set.len()]
    }
}

/// Compiles `kernel` with the prelude for `kind` and the shared definitions.
pub(super) fn shader_module(
    device: &wgpu::Device,
    label: &str,
    kind: TargetKind,
    kernel: &str,
) -> wgpu::ShaderModule {
    let source = format!("{}{}{}", kind.prelude(), SHARED_WGSL, kernel);
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{label} ({})", kind.name())),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

/// Workgroups needed to cover `width` x `height` threads.
///
/// Kernels bounds-check, so the grid may overshoot by less than one group.
pub(super) fn workgroup_count(width: u32, height: u32) -> (u32, u32) {
    (
        width.div_ceil(WORKGROUP_SIZE),
        height.div_ceil(WORKGROUP_SIZE),
    )
}

// ── bind group layout entries ─────────────────────────────────────────────

pub(super) fn sampled_texture_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

pub(super) fn storage_texture_entry(binding: u32, kind: TargetKind) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format: kind.format(),
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    }
}

pub(super) fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    size: u64,
    has_dynamic_offset: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset,
            min_binding_size: wgpu::BufferSize::new(size),
        },
        count: None,
    }
}

/// Compute pipeline with an explicit layout.
pub(super) fn compute_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    entry_point: &str,
) -> wgpu::ComputePipeline {
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        module,
        entry_point: Some(entry_point),
        compilation_options: Default::default(),
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workgroups_round_up() {
        assert_eq!(workgroup_count(8, 8), (1, 1));
        assert_eq!(workgroup_count(9, 1), (2, 1));
        assert_eq!(workgroup_count(2000, 1000), (250, 125));
        assert_eq!(workgroup_count(0, 0), (0, 0));
    }

    #[test]
    fn variants_rotate_per_kind() {
        let v = Variants::build(3, |kind, i| (kind, i));
        assert_eq!(*v.pick(TargetKind::Intermediate, 0), (TargetKind::Intermediate, 0));
        assert_eq!(*v.pick(TargetKind::Intermediate, 4), (TargetKind::Intermediate, 1));
        assert_eq!(*v.pick(TargetKind::Output, 5), (TargetKind::Output, 2));
    }

    #[test]
    fn prelude_declares_target_format() {
        assert!(TargetKind::Intermediate.prelude().contains("rgba16float"));
        assert!(TargetKind::Output.prelude().contains("rgba8unorm"));
        assert!(TargetKind::Output.prelude().contains("linear_to_srgb"));
        assert_eq!(TargetKind::ALL.len(), 2);
    }
}
