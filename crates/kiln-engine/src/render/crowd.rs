use glam::Mat4;

use crate::gpu::WgpuBuffer;
use crate::render::{Camera, Mesh, MeshVertex, RenderCtx, RenderTarget};
use crate::shader::{
    BindError, BindSession, ShaderInterface, INSTANCE_MODEL_ATTRIBUTE, MODEL_UNIFORM,
    VIEW_PROJECTION_UNIFORM,
};

use super::common::{color_target, load_pass, uniform_buffer, uniform_entry};

const CAMERA_BINDING: u32 = 0;
const MODEL_BINDING: u32 = 1;
const INSTANCE_MODEL_LOCATION: u32 = 2;

const MATRIX_BYTES: usize = std::mem::size_of::<Mat4>();

/// Draws an instanced group as copies of one mesh.
///
/// The group transform and per-member matrices are read from the
/// [`BindSession`] the group was bound into; the camera is written here.
#[derive(Default)]
pub struct CrowdRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    camera_ubo: Option<wgpu::Buffer>,
    model_ubo: Option<wgpu::Buffer>,
}

impl CrowdRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names and slots the crowd pipeline exposes.
    pub fn interface() -> ShaderInterface {
        ShaderInterface::new("kiln crowd")
            .with_uniform(VIEW_PROJECTION_UNIFORM, CAMERA_BINDING)
            .with_uniform(MODEL_UNIFORM, MODEL_BINDING)
            .with_attribute("position", 0)
            .with_attribute("normal", 1)
            .with_attribute(INSTANCE_MODEL_ATTRIBUTE, INSTANCE_MODEL_LOCATION)
    }

    /// Draws whatever group is bound in `session`, one instance per member.
    ///
    /// Returns `Ok` without drawing when no group is bound.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        session: &BindSession<'_, WgpuBuffer>,
        mesh: &Mesh,
        camera: &Camera,
    ) -> Result<(), BindError> {
        let (model_location, attribute) = resolve_slots(session.require_program()?)?;

        let Some(source) = session.instance_source(attribute) else {
            log::trace!("CrowdRenderer: nothing bound to `{INSTANCE_MODEL_ATTRIBUTE}`");
            return Ok(());
        };
        if source.instances == 0 {
            return Ok(());
        }
        let model = session.matrix_uniform(model_location).unwrap_or(Mat4::IDENTITY);

        self.ensure_pipeline(ctx);
        self.ensure_bindings(ctx);
        self.write_uniforms(ctx, camera, model);

        let Some(pipeline) = self.pipeline.as_ref() else { return Ok(()) };
        let Some(bind_group) = self.bind_group.as_ref() else { return Ok(()) };

        let mut rpass = load_pass(target, "kiln crowd pass");
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(1, source.buffer.slice());
        mesh.draw_instanced(&mut rpass, source.instances);

        Ok(())
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.target_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("kiln crowd shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/crowd.wgsl").into()),
        });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("kiln crowd bgl"),
                    entries: &[
                        uniform_entry(CAMERA_BINDING, wgpu::ShaderStages::VERTEX, MATRIX_BYTES),
                        uniform_entry(MODEL_BINDING, wgpu::ShaderStages::VERTEX, MATRIX_BYTES),
                    ],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("kiln crowd pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("kiln crowd pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout(), instance_layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &color_target(ctx.target_format, Some(wgpu::BlendState::REPLACE)),
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // No depth buffer; culling keeps a single cube's faces ordered.
                cull_mode: Some(wgpu::Face::Back),
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
        self.camera_ubo = None;
        self.model_ubo = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.camera_ubo.is_some() && self.model_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let camera_ubo = uniform_buffer(ctx.device, "kiln crowd camera ubo", MATRIX_BYTES);
        let model_ubo = uniform_buffer(ctx.device, "kiln crowd model ubo", MATRIX_BYTES);

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kiln crowd bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: CAMERA_BINDING,
                    resource: camera_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: MODEL_BINDING,
                    resource: model_ubo.as_entire_binding(),
                },
            ],
        });

        self.camera_ubo = Some(camera_ubo);
        self.model_ubo = Some(model_ubo);
        self.bind_group = Some(bind_group);
    }

    fn write_uniforms(&self, ctx: &RenderCtx<'_>, camera: &Camera, model: Mat4) {
        let (Some(camera_ubo), Some(model_ubo)) = (self.camera_ubo.as_ref(), self.model_ubo.as_ref())
        else {
            return;
        };
        let view_projection = camera.view_projection(ctx.viewport.aspect());
        ctx.queue.write_buffer(camera_ubo, 0, bytemuck::bytes_of(&view_projection));
        ctx.queue.write_buffer(model_ubo, 0, bytemuck::bytes_of(&model));
    }
}

/// Looks up the `model` uniform and `instance_model` attribute in `program`.
///
/// The instance layout is baked into the pipeline, so a program that places
/// `instance_model` anywhere but [`INSTANCE_MODEL_LOCATION`] is rejected.
fn resolve_slots(program: &ShaderInterface) -> Result<(u32, u32), BindError> {
    let model = program
        .uniform_location(MODEL_UNIFORM)
        .ok_or_else(|| BindError::MissingUniform {
            program: program.label().to_string(),
            name: MODEL_UNIFORM,
        })?;
    let attribute = program
        .attribute_location(INSTANCE_MODEL_ATTRIBUTE)
        .ok_or_else(|| BindError::MissingAttribute {
            program: program.label().to_string(),
            name: INSTANCE_MODEL_ATTRIBUTE,
        })?;

    if attribute != INSTANCE_MODEL_LOCATION {
        log::warn!(
            "CrowdRenderer: `{}` has `{INSTANCE_MODEL_ATTRIBUTE}` at {attribute}",
            program.label()
        );
        return Err(BindError::LocationMismatch {
            program: program.label().to_string(),
            name: INSTANCE_MODEL_ATTRIBUTE,
            expected: INSTANCE_MODEL_LOCATION,
            found: attribute,
        });
    }

    Ok((model, attribute))
}

/// One column-major `mat4x4<f32>` per instance, split over four locations.
fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4
    ];

    wgpu::VertexBufferLayout {
        array_stride: MATRIX_BYTES as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &ATTRS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crowd::MATRIX_SIZE;

    #[test]
    fn interface_exposes_group_names() {
        let iface = CrowdRenderer::interface();
        assert_eq!(iface.uniform_location(MODEL_UNIFORM), Some(MODEL_BINDING));
        assert_eq!(iface.uniform_location(VIEW_PROJECTION_UNIFORM), Some(CAMERA_BINDING));
        assert_eq!(
            iface.attribute_location(INSTANCE_MODEL_ATTRIBUTE),
            Some(INSTANCE_MODEL_LOCATION)
        );
    }

    #[test]
    fn resolve_slots_accepts_own_interface() {
        assert_eq!(
            resolve_slots(&CrowdRenderer::interface()),
            Ok((MODEL_BINDING, INSTANCE_MODEL_LOCATION))
        );
    }

    #[test]
    fn resolve_slots_rejects_moved_instance_attribute() {
        let moved = ShaderInterface::new("moved")
            .with_uniform(MODEL_UNIFORM, 4)
            .with_attribute(INSTANCE_MODEL_ATTRIBUTE, 7);
        assert_eq!(
            resolve_slots(&moved),
            Err(BindError::LocationMismatch {
                program: "moved".to_string(),
                name: INSTANCE_MODEL_ATTRIBUTE,
                expected: INSTANCE_MODEL_LOCATION,
                found: 7,
            })
        );

        // The model uniform's slot is free: its value is copied into our own ubo.
        let remapped = ShaderInterface::new("remapped")
            .with_uniform(MODEL_UNIFORM, 4)
            .with_attribute(INSTANCE_MODEL_ATTRIBUTE, INSTANCE_MODEL_LOCATION);
        assert_eq!(resolve_slots(&remapped), Ok((4, INSTANCE_MODEL_LOCATION)));
    }

    #[test]
    fn instance_layout_matches_group_slots() {
        let layout = instance_layout();
        assert_eq!(layout.array_stride, MATRIX_SIZE);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);

        let locations: Vec<u32> = layout.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![2, 3, 4, 5]);
        let offsets: Vec<u64> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 16, 32, 48]);
    }
}
