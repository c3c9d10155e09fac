use anyhow::{Context, Result};

use crate::render::{RenderCtx, RenderTarget, Viewport};

use super::{GpuFrame, GpuInit, OffscreenTarget};

/// Owns wgpu core objects and the offscreen target.
///
/// This type is the low-level rendering context:
/// - creates and stores Instance/Adapter/Device/Queue
/// - owns the color texture frames are drawn into
/// - creates frame encoders and submits them
pub struct Gpu {
    /// Kept alive for the lifetime of the adapter.
    _instance: wgpu::Instance,

    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    target: OffscreenTarget,
}

impl Gpu {
    /// Creates a headless GPU context.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: GpuInit) -> Result<Self> {
        let GpuInit {
            power_preference,
            target_format,
            size,
            required_features,
            required_limits,
            allow_fallback_adapter,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(err) if allow_fallback_adapter => {
                log::warn!("no hardware adapter ({err}); trying a fallback adapter");
                instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference,
                        compatible_surface: None,
                        force_fallback_adapter: true,
                    })
                    .await
                    .context("failed to find a fallback GPU adapter")?
            }
            Err(err) => return Err(err).context("failed to find a suitable GPU adapter"),
        };

        let info = adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("kiln-engine device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let target = OffscreenTarget::new(&device, target_format, size);

        Ok(Self {
            _instance: instance,
            adapter,
            device,
            queue,
            target,
        })
    }

    /// Blocking wrapper around [`Gpu::new`] for synchronous callers.
    pub fn new_blocking(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    #[inline]
    pub fn target(&self) -> &OffscreenTarget {
        &self.target
    }

    #[inline]
    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target.format()
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.target.size()
    }

    /// Renderer context for the current target. Also the wgpu `BufferDevice`.
    pub fn render_ctx(&self) -> RenderCtx<'_> {
        RenderCtx::new(&self.device, &self.queue, self.target_format(), self.viewport())
    }

    /// Recreates the offscreen target at `size`.
    ///
    /// Zero-sized requests are ignored; the current target stays in place.
    pub fn resize(&mut self, size: Viewport) {
        if !size.is_valid() {
            log::debug!("Gpu::resize: ignoring {}x{}", size.width, size.height);
            return;
        }
        if size == self.target.size() {
            return;
        }
        self.target = OffscreenTarget::new(&self.device, self.target.format(), size);
    }

    pub fn begin_frame(&self) -> GpuFrame {
        let view = self.target.create_view();
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("kiln frame encoder"),
            });

        GpuFrame { view, encoder }
    }

    /// Submits the recorded commands for the given frame.
    pub fn submit(&self, frame: GpuFrame) -> wgpu::SubmissionIndex {
        let GpuFrame { view, encoder } = frame;
        let index = self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        index
    }

    /// Records one frame: clears the target to `clear`, runs `draw`, submits.
    pub fn render<F>(&self, clear: wgpu::Color, draw: F) -> wgpu::SubmissionIndex
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        let mut frame = self.begin_frame();

        {
            let _clear_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("kiln clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        let ctx = self.render_ctx();
        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            draw(&ctx, &mut target);
        }

        self.submit(frame)
    }
}
