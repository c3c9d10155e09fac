//! Shader binding contract.
//!
//! A pipeline publishes the names of its matrix uniforms and vertex attributes
//! through a [`ShaderInterface`]. Objects that feed a pipeline (for example an
//! `InstancedGroup`) resolve those names against the program that is active in
//! a [`BindSession`] and record their data there; renderers read the session
//! back when encoding draws.

mod interface;
mod session;

pub use interface::{ShaderInterface, INSTANCE_MODEL_ATTRIBUTE, MODEL_UNIFORM, VIEW_PROJECTION_UNIFORM};
pub use session::{BindError, BindSession, InstanceSource};
