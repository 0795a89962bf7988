use crate::layers::GpuLayers;
use crate::render::{RenderCtx, Target};

use super::common::{
    compute_pipeline, sampled_texture_entry, shader_module, storage_texture_entry,
    workgroup_count, TargetKind, Variants, PIPELINE_VARIANTS,
};
use super::plan::{BlendPlan, BlendStep, Dest, Source};
use super::{check_output, BlendError, BlendStrategy, Blender};

/// One compute dispatch per layer over the full image.
pub struct ComputeBlender {
    layers: GpuLayers,
    plan: BlendPlan,
    intermediates: [Target; BlendPlan::INTERMEDIATE_SLOTS],
    layouts: [wgpu::BindGroupLayout; 2],
    pipelines: Variants<wgpu::ComputePipeline>,
}

impl ComputeBlender {
    pub fn new(ctx: &RenderCtx<'_>, layers: &GpuLayers) -> Result<Self, BlendError> {
        let plan = BlendPlan::new(layers.len())?;
        let (width, height) = layers.size();
        let device = ctx.device;

        let intermediates = [0, 1].map(|i| {
            Target::intermediate(device, &format!("tbdr compute intermediate #{i}"), width, height)
        });

        let layouts = TargetKind::ALL.map(|kind| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("tbdr compute bgl ({})", kind.name())),
                entries: &[
                    sampled_texture_entry(
                        0,
                        wgpu::ShaderStages::COMPUTE,
                        wgpu::TextureViewDimension::D2,
                    ),
                    sampled_texture_entry(
                        1,
                        wgpu::ShaderStages::COMPUTE,
                        wgpu::TextureViewDimension::D2,
                    ),
                    storage_texture_entry(2, kind),
                ],
            })
        });

        let modules = TargetKind::ALL.map(|kind| {
            shader_module(
                device,
                "tbdr compute blend shader",
                kind,
                include_str!("shaders/compute_blend.wgsl"),
            )
        });

        let pipeline_layouts = TargetKind::ALL.map(|kind| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("tbdr compute pipeline layout ({})", kind.name())),
                bind_group_layouts: &[&layouts[kind.index()]],
                immediate_size: 0,
            })
        });

        let pipelines = Variants::build(PIPELINE_VARIANTS, |kind, i| {
            compute_pipeline(
                device,
                &format!("tbdr compute pipeline #{i} ({})", kind.name()),
                &pipeline_layouts[kind.index()],
                &modules[kind.index()],
                "blend_main",
            )
        });

        Ok(Self {
            layers: layers.clone(),
            plan,
            intermediates,
            layouts,
            pipelines,
        })
    }

    fn encode_step(
        &self,
        ctx: &RenderCtx<'_>,
        pass: &mut wgpu::ComputePass<'_>,
        step: &BlendStep,
        output: &Target,
        call: u32,
    ) {
        let src1 = match step.src1 {
            Source::Layer(i) => self.layers.layer_view(i),
            Source::Intermediate(slot) => self.intermediates[slot].view(),
        };
        let src2 = self.layers.layer_view(step.src2);
        let (kind, dst) = match step.dst {
            Dest::Intermediate(slot) => (TargetKind::Intermediate, &self.intermediates[slot]),
            Dest::Output => (TargetKind::Output, output),
        };

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tbdr compute bind group"),
            layout: &self.layouts[kind.index()],
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(src1),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(src2),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(dst.view()),
                },
            ],
        });

        let (width, height) = dst.size();
        let (gx, gy) = workgroup_count(width, height);
        pass.set_pipeline(self.pipelines.pick(kind, call));
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(gx, gy, 1);
    }
}

impl Blender for ComputeBlender {
    fn strategy(&self) -> BlendStrategy {
        BlendStrategy::Compute
    }

    fn encode(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        output: &Target,
    ) -> Result<u32, BlendError> {
        check_output(self.layers.size(), output)?;

        let mut calls = 0u32;
        let Some((last, merge)) = self.plan.steps().split_last() else {
            return Ok(0);
        };

        if !merge.is_empty() {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("tbdr merge pass"),
                timestamp_writes: None,
            });
            for step in merge {
                self.encode_step(ctx, &mut pass, step, output, calls);
                calls += 1;
            }
        }

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("tbdr final pass"),
            timestamp_writes: None,
        });
        self.encode_step(ctx, &mut pass, last, output, calls);
        calls += 1;

        Ok(calls)
    }
}
