//! Headless GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a window
//! - owning the offscreen color target renderers draw into
//! - handing out per-frame encoders and submitting them

mod context;
mod frame;
mod init;
mod target;

pub use context::Gpu;
pub use frame::GpuFrame;
pub use init::GpuInit;
pub use target::OffscreenTarget;
