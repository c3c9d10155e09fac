/// Sorted, duplicate-free set of point indices.
///
/// Backed by a `Vec` that starts at [`AnchorIndex::INITIAL_CAPACITY`] slots and
/// doubles whenever an insert would overflow it.
#[derive(Debug, PartialEq, Eq)]
pub struct AnchorIndex {
    indices: Vec<usize>,
}

impl AnchorIndex {
    pub const INITIAL_CAPACITY: usize = 64;

    /// Index set holding `first` and `last`. Callers guarantee `first < last`.
    pub(crate) fn endpoints(first: usize, last: usize) -> Self {
        debug_assert!(first < last);
        let mut indices = Vec::with_capacity(Self::INITIAL_CAPACITY);
        indices.push(first);
        indices.push(last);
        Self { indices }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.indices.capacity()
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// Inserts `index` at its sorted position.
    ///
    /// Returns the slot it landed in, or `None` if it was already present.
    pub fn insert(&mut self, index: usize) -> Option<usize> {
        let slot = self.indices.binary_search(&index).err()?;

        if self.indices.len() == self.indices.capacity() {
            let old = self.indices.capacity();
            self.indices.reserve_exact(old.max(1));
            log::debug!(
                "AnchorIndex: grew from {old} to {} slots",
                self.indices.capacity()
            );
        }

        self.indices.insert(slot, index);
        Some(slot)
    }

    /// Consecutive anchor pairs, one per segment.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.indices.windows(2).map(|w| (w[0], w[1]))
    }
}

impl Clone for AnchorIndex {
    /// Keeps the source's slot count (never below `INITIAL_CAPACITY`).
    fn clone(&self) -> Self {
        let mut indices = Vec::with_capacity(self.indices.capacity().max(Self::INITIAL_CAPACITY));
        indices.extend_from_slice(&self.indices);
        Self { indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_endpoints() {
        let a = AnchorIndex::endpoints(0, 9);
        assert_eq!(a.as_slice(), &[0, 9]);
        assert!(a.capacity() >= AnchorIndex::INITIAL_CAPACITY);
        assert!(a.contains(0) && a.contains(9) && !a.contains(4));
    }

    #[test]
    fn insert_keeps_order_and_reports_slot() {
        let mut a = AnchorIndex::endpoints(0, 9);
        assert_eq!(a.insert(5), Some(1));
        assert_eq!(a.insert(2), Some(1));
        assert_eq!(a.insert(7), Some(3));
        assert_eq!(a.as_slice(), &[0, 2, 5, 7, 9]);
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut a = AnchorIndex::endpoints(0, 9);
        assert_eq!(a.insert(9), None);
        assert_eq!(a.insert(0), None);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn growth_preserves_entries() {
        let n = AnchorIndex::INITIAL_CAPACITY * 3;
        let mut a = AnchorIndex::endpoints(0, n);
        for i in (1..n).rev() {
            a.insert(i);
        }
        assert_eq!(a.len(), n + 1);
        assert!(a.as_slice().iter().copied().eq(0..=n));
        assert!(a.capacity() >= n + 1);
    }

    #[test]
    fn clone_keeps_slot_count() {
        let a = AnchorIndex::endpoints(0, 9);
        let b = a.clone();
        assert_eq!(b, a);
        assert!(b.capacity() >= AnchorIndex::INITIAL_CAPACITY);

        let n = AnchorIndex::INITIAL_CAPACITY * 2;
        let mut grown = AnchorIndex::endpoints(0, n);
        for i in 1..n {
            grown.insert(i);
        }
        assert!(grown.clone().capacity() >= grown.capacity());
    }

    #[test]
    fn pairs_walk_segments() {
        let mut a = AnchorIndex::endpoints(0, 4);
        a.insert(2);
        assert_eq!(a.pairs().collect::<Vec<_>>(), vec![(0, 2), (2, 4)]);
    }
}
