//! Procedural geometry.
//!
//! - `bezier`: composite Bezier curves over a fixed point set, flattened into
//!   line strips
//! - `line_strip`: CPU polylines and their GPU upload

mod anchors;
pub mod bezier;
pub mod line_strip;

pub use anchors::AnchorIndex;
pub use bezier::{CurveBuilder, CurveError, Segment};
pub use line_strip::{GpuLineStrip, LineStrip, LineStripError};
