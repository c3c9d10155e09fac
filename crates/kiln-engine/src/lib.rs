//! Kiln engine crate.
//!
//! Instanced transform groups and Bezier curve building over a small GPU
//! buffer layer, with wgpu renderers and a headless device.

pub mod crowd;
pub mod device;
pub mod geometry;
pub mod gpu;
pub mod logging;
pub mod render;
pub mod shader;
