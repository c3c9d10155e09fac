use crate::render::Viewport;

/// Initialization parameters for the headless GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Adapter selection hint.
    pub power_preference: wgpu::PowerPreference,

    /// Format of the offscreen color target.
    pub target_format: wgpu::TextureFormat,

    /// Offscreen target size in pixels.
    pub size: Viewport,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Accept a software adapter when no hardware one is found.
    pub allow_fallback_adapter: bool,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            target_format: wgpu::TextureFormat::Rgba8UnormSrgb,
            size: Viewport::new(1280, 720),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            allow_fallback_adapter: true,
        }
    }
}
