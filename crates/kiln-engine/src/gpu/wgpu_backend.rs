use wgpu::util::DeviceExt;

use crate::render::RenderCtx;

use super::buffer::{check_size, check_write, BufferDesc, BufferDevice, BufferError, BufferUsage, GpuBuffer};

/// Buffer backed by a `wgpu::Buffer`.
///
/// Writes go through `Queue::write_buffer`, which stages the bytes and applies
/// them before the next submitted command buffer.
#[derive(Debug)]
pub struct WgpuBuffer {
    buffer: wgpu::Buffer,
    queue: wgpu::Queue,
    size: u64,
}

impl WgpuBuffer {
    #[inline]
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    #[inline]
    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..)
    }
}

impl GpuBuffer for WgpuBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), BufferError> {
        check_write(self.size, offset, data.len())?;

        let align = wgpu::COPY_BUFFER_ALIGNMENT;
        let len = data.len() as u64;
        if offset % align != 0 || len % align != 0 {
            return Err(BufferError::Misaligned { offset, len, align });
        }

        self.queue.write_buffer(&self.buffer, offset, data);
        Ok(())
    }
}

impl Drop for WgpuBuffer {
    fn drop(&mut self) {
        self.buffer.destroy();
    }
}

fn usage_flags(usage: BufferUsage) -> wgpu::BufferUsages {
    let role = match usage {
        BufferUsage::Vertex | BufferUsage::Instance => wgpu::BufferUsages::VERTEX,
        BufferUsage::Index => wgpu::BufferUsages::INDEX,
        BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM,
    };
    role | wgpu::BufferUsages::COPY_DST
}

impl BufferDevice for RenderCtx<'_> {
    type Buffer = WgpuBuffer;

    fn create_buffer(
        &self,
        desc: &BufferDesc<'_>,
        contents: &[u8],
    ) -> Result<WgpuBuffer, BufferError> {
        let limit = self.device.limits().max_buffer_size;
        let size = check_size(desc.label, contents.len(), limit)?;

        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(desc.label),
            contents,
            usage: usage_flags(desc.usage),
        });
        log::debug!("wgpu buffer `{}`: {} bytes ({:?})", desc.label, size, desc.usage);

        Ok(WgpuBuffer {
            buffer,
            queue: self.queue.clone(),
            size,
        })
    }
}
