//! Instanced transform groups.
//!
//! An [`InstancedGroup`] owns a fixed pool of members, each with its own
//! position, rotation and scale, and mirrors their model matrices into one GPU
//! buffer that a renderer consumes as a per-instance attribute. Editing one
//! member rewrites only that member's 64-byte slot.

mod error;
mod group;
mod transform;

pub use error::GroupError;
pub use group::{InstancedGroup, MATRIX_SIZE};
pub use transform::MemberTransform;
