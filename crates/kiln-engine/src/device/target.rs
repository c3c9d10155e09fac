use crate::render::Viewport;

/// Color texture rendered into instead of a swapchain image.
pub struct OffscreenTarget {
    texture: wgpu::Texture,
    format: wgpu::TextureFormat,
    size: Viewport,
}

impl OffscreenTarget {
    /// Creates the texture. A zero dimension is clamped to 1; wgpu rejects
    /// empty textures.
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, size: Viewport) -> Self {
        let size = clamp_size(size);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("kiln offscreen target"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        Self {
            texture,
            format,
            size,
        }
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    #[inline]
    pub fn size(&self) -> Viewport {
        self.size
    }

    #[inline]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn create_view(&self) -> wgpu::TextureView {
        self.texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}

fn clamp_size(size: Viewport) -> Viewport {
    Viewport::new(size.width.max(1), size.height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_clamp_to_one() {
        assert_eq!(clamp_size(Viewport::new(0, 0)), Viewport::new(1, 1));
        assert_eq!(clamp_size(Viewport::new(640, 0)), Viewport::new(640, 1));
        assert_eq!(clamp_size(Viewport::new(640, 480)), Viewport::new(640, 480));
    }
}
