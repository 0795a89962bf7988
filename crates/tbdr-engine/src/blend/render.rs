use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::layers::GpuLayers;
use crate::render::{RenderCtx, Target};
use crate::shared::Vertex;

use super::common::{
    sampled_texture_entry, shader_module, uniform_entry, TargetKind, Variants, PIPELINE_VARIANTS,
};
use super::plan::{BlendPlan, BlendStep, Dest, Source};
use super::{check_output, BlendError, BlendStrategy, Blender};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    drawable_size: [f32; 2],
    _pad: [f32; 2],
}

impl ViewportUniform {
    fn new(width: u32, height: u32) -> Self {
        Self {
            drawable_size: [width as f32, height as f32],
            _pad: [0.0; 2],
        }
    }
}

const VIEWPORT_SIZE: u64 = core::mem::size_of::<ViewportUniform>() as u64;

/// One render pass per layer, each drawing a full-image strip whose
/// fragment stage blends the new layer over the running result.
pub struct RenderBlender {
    layers: GpuLayers,
    plan: BlendPlan,
    intermediates: [Target; BlendPlan::INTERMEDIATE_SLOTS],
    layout: wgpu::BindGroupLayout,
    viewport_ubo: wgpu::Buffer,
    quad_vbo: wgpu::Buffer,
    pipelines: Variants<wgpu::RenderPipeline>,
}

impl RenderBlender {
    pub fn new(ctx: &RenderCtx<'_>, layers: &GpuLayers) -> Result<Self, BlendError> {
        let plan = BlendPlan::new(layers.len())?;
        let (width, height) = layers.size();
        let device = ctx.device;

        let intermediates = [0, 1].map(|i| {
            Target::intermediate(device, &format!("tbdr render intermediate #{i}"), width, height)
        });

        let quad = Vertex::quad(width as f32, height as f32);
        let quad_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tbdr render quad vbo"),
            contents: bytemuck::cast_slice(&quad),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Every target has the working size, so the viewport never changes.
        let viewport = ViewportUniform::new(width, height);
        let viewport_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tbdr render viewport ubo"),
            contents: bytemuck::bytes_of(&viewport),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tbdr render bgl"),
            entries: &[
                sampled_texture_entry(
                    0,
                    wgpu::ShaderStages::FRAGMENT,
                    wgpu::TextureViewDimension::D2,
                ),
                sampled_texture_entry(
                    1,
                    wgpu::ShaderStages::FRAGMENT,
                    wgpu::TextureViewDimension::D2,
                ),
                uniform_entry(2, wgpu::ShaderStages::VERTEX, VIEWPORT_SIZE, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tbdr render pipeline layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });

        let modules = TargetKind::ALL.map(|kind| {
            shader_module(
                device,
                "tbdr render blend shader",
                kind,
                include_str!("shaders/render_blend.wgsl"),
            )
        });

        let pipelines = Variants::build(PIPELINE_VARIANTS, |kind, i| {
            let module = &modules[kind.index()];
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("tbdr render pipeline #{i} ({})", kind.name())),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[Vertex::layout()],
                },

                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: kind.format(),
                        // Blending happens in the shader.
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        });

        Ok(Self {
            layers: layers.clone(),
            plan,
            intermediates,
            layout,
            viewport_ubo,
            quad_vbo,
            pipelines,
        })
    }

    fn encode_step(
        &self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
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
            label: Some("tbdr render bind group"),
            layout: &self.layout,
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
                    resource: self.viewport_ubo.as_entire_binding(),
                },
            ],
        });

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tbdr layer pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: dst.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(self.pipelines.pick(kind, call));
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.set_vertex_buffer(0, self.quad_vbo.slice(..));
        rpass.draw(0..4, 0..1);
    }
}

impl Blender for RenderBlender {
    fn strategy(&self) -> BlendStrategy {
        BlendStrategy::Render
    }

    fn encode(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        output: &Target,
    ) -> Result<u32, BlendError> {
        check_output(self.layers.size(), output)?;

        let mut calls = 0u32;
        for step in self.plan.steps() {
            self.encode_step(ctx, encoder, step, output, calls);
            calls += 1;
        }
        Ok(calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_uniform_is_one_vec4() {
        assert_eq!(VIEWPORT_SIZE, 16);
    }

    #[test]
    fn viewport_holds_only_the_target_size() {
        let viewport = ViewportUniform::new(64, 32);
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&viewport));
        assert_eq!(floats, &[64.0, 32.0, 0.0, 0.0]);
    }
}
