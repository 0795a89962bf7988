use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::layers::{GpuLayers, LayerArray};
use crate::render::{RenderCtx, Target};

use super::common::{
    compute_pipeline, sampled_texture_entry, shader_module, storage_texture_entry,
    uniform_entry, workgroup_count, TargetKind,
};
use super::{check_output, BlendError, BlendStrategy, Blender};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct MonolithicUniform {
    layer_count: u32,
    _pad: [u32; 3],
}

const UNIFORM_SIZE: u64 = core::mem::size_of::<MonolithicUniform>() as u64;

/// A single dispatch that folds every layer per pixel, reading a copy of the
/// layers in one array texture. No intermediates.
pub struct MonolithicBlender {
    layers: LayerArray,
    size: (u32, u32),
    layout: wgpu::BindGroupLayout,
    params_ubo: wgpu::Buffer,
    pipeline: wgpu::ComputePipeline,
}

impl MonolithicBlender {
    pub fn new(ctx: &RenderCtx<'_>, layers: &GpuLayers) -> Result<Self, BlendError> {
        let count = layers.len();
        if count < 2 {
            return Err(BlendError::TooFewLayers(count));
        }
        let device = ctx.device;
        let array = layers.to_array(device, ctx.queue)?;

        let params = MonolithicUniform {
            layer_count: array.layer_count(),
            _pad: [0; 3],
        };
        let params_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tbdr monolithic params ubo"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tbdr monolithic bgl"),
            entries: &[
                sampled_texture_entry(
                    0,
                    wgpu::ShaderStages::COMPUTE,
                    wgpu::TextureViewDimension::D2Array,
                ),
                storage_texture_entry(1, TargetKind::Output),
                uniform_entry(2, wgpu::ShaderStages::COMPUTE, UNIFORM_SIZE, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tbdr monolithic pipeline layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });

        let module = shader_module(
            device,
            "tbdr monolithic blend shader",
            TargetKind::Output,
            include_str!("shaders/compute_monolithic.wgsl"),
        );
        let pipeline = compute_pipeline(
            device,
            "tbdr monolithic pipeline",
            &pipeline_layout,
            &module,
            "blend_all",
        );

        Ok(Self {
            layers: array,
            size: layers.size(),
            layout,
            params_ubo,
            pipeline,
        })
    }
}

impl Blender for MonolithicBlender {
    fn strategy(&self) -> BlendStrategy {
        BlendStrategy::ComputeMonolithic
    }

    fn encode(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        output: &Target,
    ) -> Result<u32, BlendError> {
        check_output(self.size, output)?;

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tbdr monolithic bind group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(self.layers.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(output.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.params_ubo.as_entire_binding(),
                },
            ],
        });

        let (width, height) = output.size();
        let (gx, gy) = workgroup_count(width, height);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("tbdr final pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(gx, gy, 1);

        Ok(1)
    }
}
