use glam::{Mat4, Quat, Vec3};

/// Cached affine state of one member (or of the group itself).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MemberTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl MemberTransform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// `Translate(position) * Rotate(rotation) * Scale(scale)`.
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    #[inline]
    pub fn translated(mut self, delta: Vec3) -> Self {
        self.position += delta;
        self
    }

    /// Applies `q` in the member's local frame (`rotation * q`).
    #[inline]
    pub fn rotated_local(mut self, q: Quat) -> Self {
        self.rotation = (self.rotation * q).normalize();
        self
    }

    /// Applies `q` in the parent frame (`q * rotation`).
    #[inline]
    pub fn rotated_global(mut self, q: Quat) -> Self {
        self.rotation = (q * self.rotation).normalize();
        self
    }

    /// Multiplies the current scale component-wise.
    #[inline]
    pub fn scaled(mut self, factor: Vec3) -> Self {
        self.scale *= factor;
        self
    }

    #[inline]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }
}

impl Default for MemberTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
