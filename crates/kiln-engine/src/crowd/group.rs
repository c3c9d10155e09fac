use glam::{Mat4, Quat, Vec3};

use crate::gpu::{BufferDesc, BufferDevice, BufferError, BufferUsage, GpuBuffer};
use crate::shader::{BindError, BindSession, InstanceSource, INSTANCE_MODEL_ATTRIBUTE, MODEL_UNIFORM};

use super::{GroupError, MemberTransform};

/// Bytes per member matrix in the transform buffer (column-major `mat4x4<f32>`).
pub const MATRIX_SIZE: u64 = core::mem::size_of::<Mat4>() as u64;

/// A pool of independently transformable members drawn with one instanced call.
///
/// Member `i`'s matrix lives at byte offset `MATRIX_SIZE * i` of the transform
/// buffer and always equals `members[i].matrix()`: every mutating call computes
/// the new state, writes that single slot, and only then commits the cache. A
/// rejected call changes neither side.
///
/// The group also carries its own transform, bound as the `model` uniform and
/// applied on top of every member.
#[derive(Debug)]
pub struct InstancedGroup<B> {
    members: Vec<MemberTransform>,
    group: MemberTransform,
    transforms: B,
}

impl<B: GpuBuffer> InstancedGroup<B> {
    /// Creates `capacity` members at the identity transform and uploads their
    /// matrices.
    pub fn create<D>(device: &D, capacity: usize) -> Result<Self, GroupError>
    where
        D: BufferDevice<Buffer = B>,
    {
        if capacity == 0 {
            return Err(GroupError::ZeroCapacity);
        }

        capacity
            .checked_mul(MATRIX_SIZE as usize)
            .ok_or(BufferError::SizeOverflow)?;

        let mut members = Vec::new();
        members
            .try_reserve_exact(capacity)
            .map_err(|_| GroupError::OutOfMemory { capacity })?;
        members.resize(capacity, MemberTransform::IDENTITY);

        // Staging copy; dropped once the buffer owns the data.
        let mut matrices: Vec<Mat4> = Vec::new();
        matrices
            .try_reserve_exact(capacity)
            .map_err(|_| GroupError::OutOfMemory { capacity })?;
        matrices.resize(capacity, Mat4::IDENTITY);

        let transforms = device.create_buffer(
            &BufferDesc::new("kiln instanced group transforms", BufferUsage::Instance),
            bytemuck::cast_slice(&matrices),
        )?;

        log::debug!("InstancedGroup: reserved {capacity} members");

        Ok(Self {
            members,
            group: MemberTransform::IDENTITY,
            transforms,
        })
    }

    /// Discards every member and re-creates the group with `capacity` members.
    ///
    /// The replacement is built before the current group is released, so a
    /// failure leaves `self` untouched. The group-level transform is kept.
    pub fn reserve<D>(&mut self, device: &D, capacity: usize) -> Result<(), GroupError>
    where
        D: BufferDevice<Buffer = B>,
    {
        let mut fresh = Self::create(device, capacity)?;
        fresh.group = self.group;
        *self = fresh;
        Ok(())
    }

    // ── members ───────────────────────────────────────────────────────────

    #[inline]
    pub fn capacity(&self) -> usize {
        self.members.len()
    }

    /// Number of members to draw. Every reserved slot is live.
    #[inline]
    pub fn population(&self) -> u32 {
        u32::try_from(self.members.len()).unwrap_or(u32::MAX)
    }

    pub fn member(&self, index: usize) -> Result<&MemberTransform, GroupError> {
        self.members.get(index).ok_or(GroupError::IndexOutOfRange {
            index,
            capacity: self.members.len(),
        })
    }

    pub fn member_position(&self, index: usize) -> Result<Vec3, GroupError> {
        self.member(index).map(|m| m.position)
    }

    pub fn member_rotation(&self, index: usize) -> Result<Quat, GroupError> {
        self.member(index).map(|m| m.rotation)
    }

    pub fn member_scale(&self, index: usize) -> Result<Vec3, GroupError> {
        self.member(index).map(|m| m.scale)
    }

    pub fn member_matrix(&self, index: usize) -> Result<Mat4, GroupError> {
        self.member(index).map(MemberTransform::matrix)
    }

    pub fn translate_member(&mut self, index: usize, delta: Vec3) -> Result<(), GroupError> {
        self.update_member(index, |m| m.translated(delta))
    }

    /// Rotates a member in its local frame.
    pub fn rotate_member(&mut self, index: usize, q: Quat) -> Result<(), GroupError> {
        self.update_member(index, |m| m.rotated_local(q))
    }

    /// Rotates a member in the group frame.
    pub fn rotate_member_global(&mut self, index: usize, q: Quat) -> Result<(), GroupError> {
        self.update_member(index, |m| m.rotated_global(q))
    }

    /// Multiplies a member's scale component-wise.
    pub fn scale_member(&mut self, index: usize, factor: Vec3) -> Result<(), GroupError> {
        self.update_member(index, |m| m.scaled(factor))
    }

    pub fn set_member_rotation(&mut self, index: usize, rotation: Quat) -> Result<(), GroupError> {
        self.update_member(index, |m| m.with_rotation(rotation))
    }

    /// Rewrites the whole transform buffer from the cached members.
    pub fn resync(&mut self) -> Result<(), GroupError> {
        let matrices: Vec<Mat4> = self.members.iter().map(MemberTransform::matrix).collect();
        self.transforms.write(0, bytemuck::cast_slice(&matrices))?;
        Ok(())
    }

    fn update_member<F>(&mut self, index: usize, f: F) -> Result<(), GroupError>
    where
        F: FnOnce(MemberTransform) -> MemberTransform,
    {
        let current = match self.member(index) {
            Ok(m) => *m,
            Err(err) => {
                log::warn!("InstancedGroup: {err}");
                return Err(err);
            }
        };

        let next = f(current);
        let offset = MATRIX_SIZE * index as u64;
        self.transforms
            .write(offset, bytemuck::bytes_of(&next.matrix()))?;
        log::trace!("InstancedGroup: wrote member {index} at offset {offset}");

        self.members[index] = next;
        Ok(())
    }

    // ── group-level transform ─────────────────────────────────────────────

    #[inline]
    pub fn group_transform(&self) -> &MemberTransform {
        &self.group
    }

    #[inline]
    pub fn group_matrix(&self) -> Mat4 {
        self.group.matrix()
    }

    pub fn set_group_position(&mut self, position: Vec3) {
        self.group.position = position;
    }

    pub fn translate_group(&mut self, delta: Vec3) {
        self.group = self.group.translated(delta);
    }

    pub fn rotate_group(&mut self, q: Quat) {
        self.group = self.group.rotated_local(q);
    }

    pub fn scale_group(&mut self, factor: Vec3) {
        self.group = self.group.scaled(factor);
    }

    // ── GPU side ──────────────────────────────────────────────────────────

    #[inline]
    pub fn transform_buffer(&self) -> &B {
        &self.transforms
    }

    /// Binds the group into the session's active program.
    ///
    /// Sets the `model` uniform to the group transform and sources the
    /// `instance_model` attribute from the transform buffer, one matrix per
    /// instance. Nothing is recorded if the program lacks either name.
    pub fn bind<'a>(&'a self, session: &mut BindSession<'a, B>) -> Result<(), BindError> {
        let (model, attribute) = resolve_locations(session).inspect_err(|err| {
            log::warn!("InstancedGroup::bind: {err}");
        })?;

        session.set_matrix_uniform(model, self.group_matrix());
        session.enable_instance_attribute(
            attribute,
            InstanceSource {
                buffer: &self.transforms,
                instances: self.population(),
                divisor: 1,
            },
        );
        Ok(())
    }

    /// Reverses [`bind`](Self::bind): disables the instance attribute and
    /// resets the `model` uniform to identity.
    pub fn unbind(&self, session: &mut BindSession<'_, B>) -> Result<(), BindError> {
        let (model, attribute) = resolve_locations(session).inspect_err(|err| {
            log::warn!("InstancedGroup::unbind: {err}");
        })?;

        session.disable_instance_attribute(attribute);
        session.set_matrix_uniform(model, Mat4::IDENTITY);
        Ok(())
    }
}

fn resolve_locations<B>(session: &BindSession<'_, B>) -> Result<(u32, u32), BindError> {
    let program = session.require_program()?;

    let model = program
        .uniform_location(MODEL_UNIFORM)
        .ok_or_else(|| BindError::MissingUniform {
            program: program.label().to_string(),
            name: MODEL_UNIFORM,
        })?;

    let attribute = program
        .attribute_location(INSTANCE_MODEL_ATTRIBUTE)
        .ok_or_else(|| BindError::MissingAttribute {
            program: program.label().to_string(),
            name: INSTANCE_MODEL_ATTRIBUTE,
        })?;

    Ok((model, attribute))
}
