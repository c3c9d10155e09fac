use thiserror::Error;

/// Role of a buffer in the pipeline.
///
/// Backends translate this into their own usage flags. Every buffer is
/// writable after creation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    /// Per-vertex attributes.
    Vertex,
    /// Per-instance attributes (step rate of one instance).
    Instance,
    /// Index data.
    Index,
    /// Uniform block.
    Uniform,
}

/// Creation parameters for a buffer.
#[derive(Debug, Copy, Clone)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub usage: BufferUsage,
}

impl<'a> BufferDesc<'a> {
    #[inline]
    pub const fn new(label: &'a str, usage: BufferUsage) -> Self {
        Self { label, usage }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer `{label}` would be empty")]
    Empty { label: String },

    #[error("buffer `{label}` needs {requested} bytes, device allows {limit}")]
    TooLarge {
        label: String,
        requested: u64,
        limit: u64,
    },

    #[error("buffer size overflows the address space")]
    SizeOverflow,

    #[error("write of {len} bytes at offset {offset} exceeds buffer size {size}")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    #[error("write at offset {offset} with {len} bytes is not {align}-byte aligned")]
    Misaligned { offset: u64, len: u64, align: u64 },

    #[error("buffer `{label}` refused the write")]
    WriteRefused { label: String },
}

/// A buffer whose data store lives on the device.
pub trait GpuBuffer {
    /// Size of the data store in bytes. Fixed at creation.
    fn size(&self) -> u64;

    /// Writes `data` at byte `offset`.
    ///
    /// A write at offset 0 covering the whole store is a full upload; anything
    /// smaller is a partial update and touches no bytes outside
    /// `offset..offset + data.len()`.
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), BufferError>;
}

/// Creates buffers initialized with `contents`.
pub trait BufferDevice {
    type Buffer: GpuBuffer;

    fn create_buffer(
        &self,
        desc: &BufferDesc<'_>,
        contents: &[u8],
    ) -> Result<Self::Buffer, BufferError>;
}

/// Bounds check shared by backends.
pub(crate) fn check_write(size: u64, offset: u64, len: usize) -> Result<(), BufferError> {
    let len = len as u64;
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(BufferError::OutOfBounds { offset, len, size }),
    }
}

/// Size check shared by backends.
pub(crate) fn check_size(label: &str, requested: usize, limit: u64) -> Result<u64, BufferError> {
    if requested == 0 {
        return Err(BufferError::Empty {
            label: label.to_string(),
        });
    }
    let requested = requested as u64;
    if requested > limit {
        return Err(BufferError::TooLarge {
            label: label.to_string(),
            requested,
            limit,
        });
    }
    Ok(requested)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_inside_bounds_is_accepted() {
        assert!(check_write(128, 64, 64).is_ok());
        assert!(check_write(128, 0, 128).is_ok());
    }

    #[test]
    fn write_past_end_is_rejected() {
        assert_eq!(
            check_write(128, 96, 64),
            Err(BufferError::OutOfBounds { offset: 96, len: 64, size: 128 })
        );
    }

    #[test]
    fn write_offset_overflow_is_rejected() {
        assert!(check_write(128, u64::MAX, 1).is_err());
    }

    #[test]
    fn empty_and_oversized_buffers_are_rejected() {
        assert!(matches!(check_size("a", 0, 16), Err(BufferError::Empty { .. })));
        assert!(matches!(check_size("a", 17, 16), Err(BufferError::TooLarge { .. })));
        assert_eq!(check_size("a", 16, 16), Ok(16));
    }
}
