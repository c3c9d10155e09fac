use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::geometry::GpuLineStrip;
use crate::gpu::WgpuBuffer;
use crate::render::{Camera, RenderCtx, RenderTarget};

use super::common::{color_target, load_pass, uniform_buffer, uniform_entry};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct LineUniform {
    view_projection: [[f32; 4]; 4],
    color: [f32; 4],
}

/// Draws a [`GpuLineStrip`] as one connected, single-color polyline.
#[derive(Default)]
pub struct LineStripRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    ubo: Option<wgpu::Buffer>,
}

impl LineStripRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `color` is straight (non-premultiplied) linear RGBA.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        strip: &GpuLineStrip<WgpuBuffer>,
        camera: &Camera,
        color: [f32; 4],
    ) {
        if strip.len() < 2 {
            return;
        }

        self.ensure_pipeline(ctx);
        self.ensure_bindings(ctx);
        self.write_uniform(ctx, camera, color);

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(positions) = strip.positions() else { return };
        let Some(indices) = strip.indices() else { return };

        let mut rpass = load_pass(target, "kiln line strip pass");
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, positions.slice());
        rpass.set_index_buffer(indices.slice(), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..strip.len(), 0, 0..1);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.target_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("kiln line shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/line.wgsl").into()),
        });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("kiln line bgl"),
                    entries: &[uniform_entry(
                        0,
                        wgpu::ShaderStages::VERTEX_FRAGMENT,
                        std::mem::size_of::<LineUniform>(),
                    )],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("kiln line pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("kiln line pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vec3>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &ATTRS,
                }],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &color_target(ctx.target_format, Some(wgpu::BlendState::ALPHA_BLENDING)),
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineStrip,
                strip_index_format: Some(wgpu::IndexFormat::Uint32),
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
        });

        self.pipeline_format = Some(ctx.target_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);

        self.bind_group = None;
        self.ubo = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.ubo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let ubo = uniform_buffer(ctx.device, "kiln line ubo", std::mem::size_of::<LineUniform>());
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kiln line bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        self.ubo = Some(ubo);
        self.bind_group = Some(bind_group);
    }

    fn write_uniform(&self, ctx: &RenderCtx<'_>, camera: &Camera, color: [f32; 4]) {
        let Some(ubo) = self.ubo.as_ref() else { return };
        let u = LineUniform {
            view_projection: camera.view_projection(ctx.viewport.aspect()).to_cols_array_2d(),
            color,
        };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_uniform_is_std140_sized() {
        // mat4x4 + vec4, no implicit padding.
        assert_eq!(std::mem::size_of::<LineUniform>(), 80);
        assert_eq!(std::mem::size_of::<LineUniform>() % 16, 0);
    }
}
