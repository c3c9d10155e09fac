/// Commands recorded for one frame.
///
/// `view` targets the device's offscreen texture. Finish the frame with
/// [`Gpu::submit`](super::Gpu::submit).
pub struct GpuFrame {
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
