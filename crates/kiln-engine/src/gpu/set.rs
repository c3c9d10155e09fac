use super::buffer::{BufferDesc, BufferDevice, BufferError, GpuBuffer};

/// A fixed group of buffers owned by one engine object.
///
/// Buffers are acquired together and released together: if any creation in
/// [`BufferSet::acquire`] fails, the buffers created before it are dropped and
/// no set is returned.
#[derive(Debug)]
pub struct BufferSet<B> {
    buffers: Vec<B>,
}

impl<B: GpuBuffer> BufferSet<B> {
    /// Creates one buffer per `(desc, contents)` entry, in order.
    pub fn acquire<D>(device: &D, entries: &[(BufferDesc<'_>, &[u8])]) -> Result<Self, BufferError>
    where
        D: BufferDevice<Buffer = B>,
    {
        let mut buffers = Vec::with_capacity(entries.len());
        for (desc, contents) in entries {
            buffers.push(device.create_buffer(desc, contents)?);
        }
        Ok(Self { buffers })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Option<&B> {
        self.buffers.get(slot)
    }

    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut B> {
        self.buffers.get_mut(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &B> {
        self.buffers.iter()
    }

    /// Changes the number of buffers in the set.
    ///
    /// Shrinking releases the trailing buffers. Growing creates one buffer per
    /// extra entry in `grow_with`; entries beyond what is needed are ignored.
    /// Returns `Ok(false)` when the count is already `count`.
    pub fn resize<D>(
        &mut self,
        device: &D,
        count: usize,
        grow_with: &[(BufferDesc<'_>, &[u8])],
    ) -> Result<bool, BufferError>
    where
        D: BufferDevice<Buffer = B>,
    {
        if count == self.buffers.len() {
            return Ok(false);
        }

        if count < self.buffers.len() {
            self.buffers.truncate(count);
            return Ok(true);
        }

        let missing = count - self.buffers.len();
        // All-or-nothing: only extend once every new buffer exists.
        let mut created = Vec::with_capacity(missing);
        for (desc, contents) in grow_with.iter().take(missing) {
            created.push(device.create_buffer(desc, contents)?);
        }
        if created.len() < missing {
            log::warn!(
                "BufferSet::resize: {} descriptors given for {} new buffers",
                grow_with.len(),
                missing
            );
            return Ok(false);
        }

        self.buffers.extend(created);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{BufferUsage, HostDevice};

    const POS: BufferDesc<'static> = BufferDesc::new("positions", BufferUsage::Vertex);
    const IDX: BufferDesc<'static> = BufferDesc::new("indices", BufferUsage::Index);

    #[test]
    fn acquire_creates_in_order() {
        let set = BufferSet::acquire(&HostDevice::new(), &[(POS, &[0u8; 12][..]), (IDX, &[0u8; 4][..])])
            .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().label(), "positions");
        assert_eq!(set.get(1).unwrap().label(), "indices");
    }

    #[test]
    fn acquire_fails_as_a_unit() {
        let device = HostDevice::with_max_buffer_size(8);
        let err = BufferSet::acquire(&device, &[(IDX, &[0u8; 4][..]), (POS, &[0u8; 12][..])]);
        assert!(err.is_err());
    }

    #[test]
    fn resize_shrinks_and_grows() {
        let device = HostDevice::new();
        let mut set =
            BufferSet::acquire(&device, &[(POS, &[0u8; 12][..]), (IDX, &[0u8; 4][..])]).unwrap();

        assert_eq!(set.resize(&device, 2, &[]), Ok(false));
        assert_eq!(set.resize(&device, 1, &[]), Ok(true));
        assert_eq!(set.len(), 1);

        assert_eq!(set.resize(&device, 2, &[(IDX, &[1u8; 4][..])]), Ok(true));
        assert_eq!(set.get(1).unwrap().bytes(), &[1, 1, 1, 1]);
    }

    #[test]
    fn resize_without_enough_descriptors_keeps_set() {
        let device = HostDevice::new();
        let mut set = BufferSet::acquire(&device, &[(POS, &[0u8; 12][..])]).unwrap();
        assert_eq!(set.resize(&device, 3, &[(IDX, &[0u8; 4][..])]), Ok(false));
        assert_eq!(set.len(), 1);
    }
}
