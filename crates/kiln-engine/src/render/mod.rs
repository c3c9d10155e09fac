//! GPU rendering subsystem.
//!
//! Renderers consume engine objects (instanced groups, line strips) and issue
//! GPU commands via wgpu. Each renderer owns its own pipeline and uniform
//! buffers and builds them lazily on first use.
//!
//! Convention:
//! - world space is right-handed, +Y up
//! - matrices are column-major `mat4x4<f32>` on both sides
//! - passes load the target; clearing is done once per frame by `device::Gpu`

mod camera;
mod common;
mod crowd;
mod ctx;
mod line_strip;
mod mesh;

pub use camera::Camera;
pub use crowd::CrowdRenderer;
pub use ctx::{RenderCtx, RenderTarget, Viewport};
pub use line_strip::LineStripRenderer;
pub use mesh::{cube_geometry, Mesh, MeshVertex};
