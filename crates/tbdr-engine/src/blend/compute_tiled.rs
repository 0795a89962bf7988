use crate::layers::GpuLayers;
use crate::render::{RenderCtx, Target};
use crate::shared::{TileGrid, TiledComputeBlendParams, TILE_COUNT};

use super::common::{
    compute_pipeline, sampled_texture_entry, shader_module, storage_texture_entry,
    uniform_entry, workgroup_count, TargetKind, Variants, PIPELINE_VARIANTS,
};
use super::plan::{BlendPlan, Dest, Source, TiledPlan, TiledStep};
use super::{check_output, BlendError, BlendStrategy, Blender};

const PARAMS_SIZE: u64 = core::mem::size_of::<TiledComputeBlendParams>() as u64;

/// One compute dispatch per layer per tile of the 2x2 grid.
///
/// Intermediates are tile-sized: each tile is folded through its own pair of
/// ping-pong textures and only the final pass touches the full-size output.
/// Every dispatch gets its own `TiledComputeBlendParams`, uploaded once into
/// a uniform buffer and selected with a dynamic offset.
pub struct TiledComputeBlender {
    layers: GpuLayers,
    plan: TiledPlan,
    /// `[slot][tile]`.
    intermediates: [[Target; TILE_COUNT]; BlendPlan::INTERMEDIATE_SLOTS],
    texture_layouts: [wgpu::BindGroupLayout; 2],
    params_bind_group: wgpu::BindGroup,
    params_stride: u32,
    pipelines: Variants<wgpu::ComputePipeline>,
}

impl TiledComputeBlender {
    pub fn new(ctx: &RenderCtx<'_>, layers: &GpuLayers) -> Result<Self, BlendError> {
        let (width, height) = layers.size();
        let grid = TileGrid::new(width, height)?;
        let plan = TiledPlan::new(layers.len(), grid)?;
        let (tile_width, tile_height) = grid.tile_size();
        let device = ctx.device;

        log::debug!(
            "tiled blend: {} dispatches per frame over {tile_width}x{tile_height} tiles",
            plan.len()
        );

        let intermediates = [0, 1].map(|slot| {
            [0, 1, 2, 3].map(|tile| {
                Target::intermediate(
                    device,
                    &format!("tbdr tile intermediate #{slot}.{tile}"),
                    u32::from(tile_width),
                    u32::from(tile_height),
                )
            })
        });

        // ── params uniform ────────────────────────────────────────────────

        let params_stride = ctx.uniform_stride(PARAMS_SIZE);
        let mut params_bytes = vec![0u8; params_stride as usize * plan.len()];
        for (i, step) in plan.steps().iter().enumerate() {
            let start = i * params_stride as usize;
            params_bytes[start..start + PARAMS_SIZE as usize]
                .copy_from_slice(bytemuck::bytes_of(&step.params));
        }

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tbdr tiled params ubo"),
            size: params_bytes.len() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        ctx.queue.write_buffer(&params_buffer, 0, &params_bytes);

        let params_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tbdr tiled params bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::COMPUTE,
                PARAMS_SIZE,
                true,
            )],
        });

        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tbdr tiled params bind group"),
            layout: &params_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &params_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(PARAMS_SIZE),
                }),
            }],
        });

        // ── pipelines ─────────────────────────────────────────────────────

        let texture_layouts = TargetKind::ALL.map(|kind| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("tbdr tiled bgl ({})", kind.name())),
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
                "tbdr tiled blend shader",
                kind,
                include_str!("shaders/compute_tiled.wgsl"),
            )
        });

        let pipeline_layouts = TargetKind::ALL.map(|kind| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("tbdr tiled pipeline layout ({})", kind.name())),
                bind_group_layouts: &[&texture_layouts[kind.index()], &params_layout],
                immediate_size: 0,
            })
        });

        let pipelines = Variants::build(PIPELINE_VARIANTS, |kind, i| {
            compute_pipeline(
                device,
                &format!("tbdr tiled pipeline #{i} ({})", kind.name()),
                &pipeline_layouts[kind.index()],
                &modules[kind.index()],
                "blend_tiled",
            )
        });

        Ok(Self {
            layers: layers.clone(),
            plan,
            intermediates,
            texture_layouts,
            params_bind_group,
            params_stride,
            pipelines,
        })
    }

    fn encode_step(
        &self,
        ctx: &RenderCtx<'_>,
        pass: &mut wgpu::ComputePass<'_>,
        index: usize,
        step: &TiledStep,
        output: &Target,
        call: u32,
    ) {
        let tile = usize::from(step.tile.get());
        let src1 = match step.step.src1 {
            Source::Layer(i) => self.layers.layer_view(i),
            Source::Intermediate(slot) => self.intermediates[slot][tile].view(),
        };
        let src2 = self.layers.layer_view(step.step.src2);
        let (kind, dst) = match step.step.dst {
            Dest::Intermediate(slot) => (TargetKind::Intermediate, &self.intermediates[slot][tile]),
            Dest::Output => (TargetKind::Output, output),
        };

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tbdr tiled bind group"),
            layout: &self.texture_layouts[kind.index()],
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

        let (gx, gy) = workgroup_count(
            u32::from(step.params.tile_width()),
            u32::from(step.params.tile_height()),
        );
        pass.set_pipeline(self.pipelines.pick(kind, call));
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_bind_group(1, &self.params_bind_group, &[index as u32 * self.params_stride]);
        pass.dispatch_workgroups(gx, gy, 1);
    }
}

impl Blender for TiledComputeBlender {
    fn strategy(&self) -> BlendStrategy {
        BlendStrategy::ComputeTiled
    }

    fn encode(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        output: &Target,
    ) -> Result<u32, BlendError> {
        check_output(self.plan.grid().working_size(), output)?;

        let steps = self.plan.steps();
        let final_start = steps
            .iter()
            .position(|s| s.step.dst == Dest::Output)
            .unwrap_or(steps.len());
        let mut calls = 0u32;

        for (label, range) in [
            ("tbdr merge pass", 0..final_start),
            ("tbdr final pass", final_start..steps.len()),
        ] {
            if range.is_empty() {
                continue;
            }
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(label),
                timestamp_writes: None,
            });
            for index in range {
                self.encode_step(ctx, &mut pass, index, &steps[index], output, calls);
                calls += 1;
            }
        }

        Ok(calls)
    }
}
