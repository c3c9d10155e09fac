//! GPU buffer-object abstraction.
//!
//! Engine types never talk to a graphics API directly; they own buffers created
//! through [`BufferDevice`] and update them through [`GpuBuffer`]:
//! - `WgpuBuffer` is the real backend (created from a `render::RenderCtx`)
//! - `HostBuffer` keeps the data store in memory and records every write
//!
//! Ownership is exclusive. A buffer is released when its owner drops it.

mod buffer;
mod host;
mod set;
mod wgpu_backend;

pub use buffer::{BufferDesc, BufferDevice, BufferError, BufferUsage, GpuBuffer};
pub use host::{HostBuffer, HostDevice};
pub use set::BufferSet;
pub use wgpu_backend::WgpuBuffer;
