use thiserror::Error;

use crate::gpu::BufferError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("instanced group needs a capacity of at least one member")]
    ZeroCapacity,

    #[error("could not reserve transform cache for {capacity} members")]
    OutOfMemory { capacity: usize },

    #[error("member {index} is out of range (capacity {capacity})")]
    IndexOutOfRange { index: usize, capacity: usize },

    #[error("transform buffer: {0}")]
    Buffer(#[from] BufferError),
}
