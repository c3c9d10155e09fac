use core::ops::Range;

use super::buffer::{check_size, check_write, BufferDesc, BufferDevice, BufferError, BufferUsage, GpuBuffer};

/// In-memory buffer backend.
///
/// Mirrors the data store a GPU would hold and records the byte range of every
/// write, so callers can verify exactly what an update touched.
#[derive(Debug, Clone, Copy)]
pub struct HostDevice {
    max_buffer_size: u64,
}

impl HostDevice {
    /// Matches `wgpu::Limits::default().max_buffer_size`.
    pub const DEFAULT_MAX_BUFFER_SIZE: u64 = 1 << 28;

    pub fn new() -> Self {
        Self {
            max_buffer_size: Self::DEFAULT_MAX_BUFFER_SIZE,
        }
    }

    /// Creates a device that refuses buffers larger than `max_buffer_size`.
    pub fn with_max_buffer_size(max_buffer_size: u64) -> Self {
        Self { max_buffer_size }
    }

    pub fn max_buffer_size(&self) -> u64 {
        self.max_buffer_size
    }
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferDevice for HostDevice {
    type Buffer = HostBuffer;

    fn create_buffer(
        &self,
        desc: &BufferDesc<'_>,
        contents: &[u8],
    ) -> Result<HostBuffer, BufferError> {
        check_size(desc.label, contents.len(), self.max_buffer_size)?;
        log::debug!("host buffer `{}`: {} bytes", desc.label, contents.len());

        Ok(HostBuffer {
            label: desc.label.to_string(),
            usage: desc.usage,
            bytes: contents.to_vec(),
            writes: Vec::new(),
            refuse_writes: false,
        })
    }
}

#[derive(Debug)]
pub struct HostBuffer {
    label: String,
    usage: BufferUsage,
    bytes: Vec<u8>,
    writes: Vec<Range<u64>>,
    refuse_writes: bool,
}

impl HostBuffer {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Current contents of the data store.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte ranges written since creation (or the last `clear_writes`), in order.
    pub fn writes(&self) -> &[Range<u64>] {
        &self.writes
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    /// While set, every write fails with `BufferError::WriteRefused` and
    /// leaves the store untouched. Simulates a device that rejects uploads.
    pub fn set_refuse_writes(&mut self, refuse: bool) {
        self.refuse_writes = refuse;
    }
}

impl GpuBuffer for HostBuffer {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), BufferError> {
        check_write(self.size(), offset, data.len())?;
        if self.refuse_writes {
            return Err(BufferError::WriteRefused {
                label: self.label.clone(),
            });
        }

        let start = offset as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        self.writes.push(offset..offset + data.len() as u64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc() -> BufferDesc<'static> {
        BufferDesc::new("test", BufferUsage::Vertex)
    }

    #[test]
    fn create_copies_contents() {
        let buf = HostDevice::new().create_buffer(&desc(), &[1, 2, 3, 4]).unwrap();
        assert_eq!(buf.bytes(), &[1, 2, 3, 4]);
        assert_eq!(buf.size(), 4);
        assert!(buf.writes().is_empty());
    }

    #[test]
    fn partial_write_only_touches_its_range() {
        let mut buf = HostDevice::new().create_buffer(&desc(), &[0; 8]).unwrap();
        buf.write(4, &[9, 9]).unwrap();
        assert_eq!(buf.bytes(), &[0, 0, 0, 0, 9, 9, 0, 0]);
        assert_eq!(buf.writes(), &[4..6]);
    }

    #[test]
    fn rejected_write_leaves_store_unchanged() {
        let mut buf = HostDevice::new().create_buffer(&desc(), &[0; 8]).unwrap();
        assert!(buf.write(6, &[1, 1, 1]).is_err());
        assert_eq!(buf.bytes(), &[0; 8]);
        assert!(buf.writes().is_empty());
    }

    #[test]
    fn refused_writes_fail_and_change_nothing() {
        let mut buf = HostDevice::new().create_buffer(&desc(), &[0; 8]).unwrap();
        buf.set_refuse_writes(true);
        assert_eq!(
            buf.write(0, &[1, 2]),
            Err(BufferError::WriteRefused { label: "test".to_string() })
        );
        assert_eq!(buf.bytes(), &[0; 8]);
        assert!(buf.writes().is_empty());

        buf.set_refuse_writes(false);
        assert!(buf.write(0, &[1, 2]).is_ok());
    }

    #[test]
    fn size_limit_is_enforced() {
        let device = HostDevice::with_max_buffer_size(4);
        assert!(device.create_buffer(&desc(), &[0; 5]).is_err());
        assert!(device.create_buffer(&desc(), &[0; 4]).is_ok());
    }
}
