use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

pub type StateId = u32;

/// A set of states used as a key during subset construction.
///
/// Members are kept sorted and free of duplicates, so two sets with the same
/// members compare and hash equally regardless of insertion order.
#[derive(Debug, Clone, Default)]
pub struct StateSet {
    inner: SmallVec<[StateId; 4]>,
}

impl StateSet {
    pub fn new<I: IntoIterator<Item = StateId>>(states: I) -> Self {
        let mut inner: SmallVec<[StateId; 4]> = states.into_iter().collect();
        inner.sort_unstable();
        inner.dedup();
        StateSet { inner }
    }

    pub fn singleton(state: StateId) -> Self {
        let mut inner = SmallVec::new();
        inner.push(state);
        StateSet { inner }
    }

    #[inline]
    pub fn inner(&self) -> &[StateId] {
        &self.inner
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn contains(&self, state: StateId) -> bool {
        self.inner.binary_search(&state).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        self.inner.iter().copied()
    }
}

impl PartialEq for StateSet {
    fn eq(&self, other: &StateSet) -> bool {
        self.inner == other.inner
    }
}

impl Eq for StateSet {}

impl Hash for StateSet {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        let mut h: u64 = self.inner.len() as u64;
        for elm in &self.inner {
            h = h.rotate_left(5) ^ u64::from(*elm);
        }
        state.write_u64(h);
    }
}
