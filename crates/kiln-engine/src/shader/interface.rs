/// Semantic name of the object-level model matrix uniform.
pub const MODEL_UNIFORM: &str = "model";

/// Semantic name of the camera view-projection uniform.
pub const VIEW_PROJECTION_UNIFORM: &str = "view_projection";

/// Semantic name of the per-instance model matrix attribute.
pub const INSTANCE_MODEL_ATTRIBUTE: &str = "instance_model";

/// Named binding points of a shader program.
///
/// Uniforms map to bind-group binding indices, attributes to the first vertex
/// `@location` they occupy (a `mat4x4` attribute spans four locations).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    label: String,
    uniforms: Vec<(String, u32)>,
    attributes: Vec<(String, u32)>,
}

impl ShaderInterface {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Declares a uniform. Redeclaring a name replaces its binding.
    pub fn with_uniform(mut self, name: impl Into<String>, binding: u32) -> Self {
        upsert(&mut self.uniforms, name.into(), binding);
        self
    }

    /// Declares a vertex attribute. Redeclaring a name replaces its location.
    pub fn with_attribute(mut self, name: impl Into<String>, location: u32) -> Self {
        upsert(&mut self.attributes, name.into(), location);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn uniform_location(&self, name: &str) -> Option<u32> {
        lookup(&self.uniforms, name)
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        lookup(&self.attributes, name)
    }
}

fn upsert(slots: &mut Vec<(String, u32)>, name: String, value: u32) {
    match slots.iter_mut().find(|(n, _)| *n == name) {
        Some(slot) => slot.1 = value,
        None => slots.push((name, value)),
    }
}

fn lookup(slots: &[(String, u32)], name: &str) -> Option<u32> {
    slots.iter().find(|(n, _)| n == name).map(|&(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_resolve_declared_names() {
        let iface = ShaderInterface::new("crowd")
            .with_uniform(MODEL_UNIFORM, 1)
            .with_attribute(INSTANCE_MODEL_ATTRIBUTE, 2);

        assert_eq!(iface.label(), "crowd");
        assert_eq!(iface.uniform_location(MODEL_UNIFORM), Some(1));
        assert_eq!(iface.attribute_location(INSTANCE_MODEL_ATTRIBUTE), Some(2));
        assert_eq!(iface.uniform_location("missing"), None);
        // Uniform and attribute namespaces are separate.
        assert_eq!(iface.attribute_location(MODEL_UNIFORM), None);
    }

    #[test]
    fn redeclaring_replaces() {
        let iface = ShaderInterface::new("x")
            .with_uniform(MODEL_UNIFORM, 0)
            .with_uniform(MODEL_UNIFORM, 3);
        assert_eq!(iface.uniform_location(MODEL_UNIFORM), Some(3));
    }
}
