use glam::Mat4;
use thiserror::Error;

use super::ShaderInterface;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("no shader program is active")]
    NoActiveProgram,

    #[error("program `{program}` has no matrix uniform `{name}`")]
    MissingUniform { program: String, name: &'static str },

    #[error("program `{program}` has no vertex attribute `{name}`")]
    MissingAttribute { program: String, name: &'static str },

    #[error("program `{program}` puts `{name}` at location {found}, pipeline expects {expected}")]
    LocationMismatch {
        program: String,
        name: &'static str,
        expected: u32,
        found: u32,
    },
}

/// Per-instance attribute source recorded in a session.
#[derive(Debug)]
pub struct InstanceSource<'a, B> {
    pub buffer: &'a B,
    /// Number of instances available in `buffer`.
    pub instances: u32,
    /// Instances advanced per attribute element. Always 1 for model matrices.
    pub divisor: u32,
}

impl<B> Clone for InstanceSource<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for InstanceSource<'_, B> {}

/// Binding state for one pass.
///
/// Holds the active program and whatever objects have bound into it. This is
/// the explicit replacement for querying the current program from global
/// graphics state.
#[derive(Debug)]
pub struct BindSession<'a, B> {
    program: Option<&'a ShaderInterface>,
    matrices: Vec<(u32, Mat4)>,
    instance_sources: Vec<(u32, InstanceSource<'a, B>)>,
}

impl<B> Default for BindSession<'_, B> {
    fn default() -> Self {
        Self {
            program: None,
            matrices: Vec::new(),
            instance_sources: Vec::new(),
        }
    }
}

impl<'a, B> BindSession<'a, B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session with `program` already active.
    pub fn with_program(program: &'a ShaderInterface) -> Self {
        let mut session = Self::new();
        session.use_program(program);
        session
    }

    /// Makes `program` active. Bindings recorded for a previous program are
    /// discarded since their locations no longer apply.
    pub fn use_program(&mut self, program: &'a ShaderInterface) {
        self.program = Some(program);
        self.matrices.clear();
        self.instance_sources.clear();
    }

    pub fn clear_program(&mut self) {
        self.program = None;
        self.matrices.clear();
        self.instance_sources.clear();
    }

    #[inline]
    pub fn program(&self) -> Option<&'a ShaderInterface> {
        self.program
    }

    /// Returns the active program or `BindError::NoActiveProgram`.
    pub fn require_program(&self) -> Result<&'a ShaderInterface, BindError> {
        self.program.ok_or(BindError::NoActiveProgram)
    }

    pub fn set_matrix_uniform(&mut self, location: u32, value: Mat4) {
        match self.matrices.iter_mut().find(|(l, _)| *l == location) {
            Some(slot) => slot.1 = value,
            None => self.matrices.push((location, value)),
        }
    }

    pub fn matrix_uniform(&self, location: u32) -> Option<Mat4> {
        self.matrices
            .iter()
            .find(|(l, _)| *l == location)
            .map(|&(_, m)| m)
    }

    pub fn enable_instance_attribute(&mut self, location: u32, source: InstanceSource<'a, B>) {
        match self.instance_sources.iter_mut().find(|(l, _)| *l == location) {
            Some(slot) => slot.1 = source,
            None => self.instance_sources.push((location, source)),
        }
    }

    /// Returns whether an attribute was enabled at `location`.
    pub fn disable_instance_attribute(&mut self, location: u32) -> bool {
        let before = self.instance_sources.len();
        self.instance_sources.retain(|(l, _)| *l != location);
        self.instance_sources.len() != before
    }

    pub fn instance_source(&self, location: u32) -> Option<InstanceSource<'a, B>> {
        self.instance_sources
            .iter()
            .find(|(l, _)| *l == location)
            .map(|&(_, s)| s)
    }
}
