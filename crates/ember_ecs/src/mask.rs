use crate::{ComponentIndex, MAX_COMPONENTS};
use std::fmt;

/// Per-slot set of attached component types, one bit per [`ComponentIndex`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ComponentMask(u64);

const _: () = assert!(MAX_COMPONENTS <= u64::BITS as usize);

impl ComponentMask {
    pub const EMPTY: ComponentMask = ComponentMask(0);

    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn contains(self, index: ComponentIndex) -> bool {
        self.0 & index.bit() != 0
    }

    /// Returns `true` if every bit of `other` is also set in `self`.
    #[inline]
    pub fn contains_all(self, other: ComponentMask) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, index: ComponentIndex) {
        self.0 |= index.bit();
    }

    #[inline]
    pub fn remove(&mut self, index: ComponentIndex) {
        self.0 &= !index.bit();
    }

    #[inline]
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates over set component indices in ascending order.
    pub fn iter(self) -> impl Iterator<Item = ComponentIndex> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let index = bits.trailing_zeros();
            bits &= bits - 1;
            Some(ComponentIndex::from_raw(index as u8))
        })
    }
}

impl FromIterator<ComponentIndex> for ComponentMask {
    fn from_iter<I: IntoIterator<Item = ComponentIndex>>(iter: I) -> Self {
        let mut mask = ComponentMask::EMPTY;
        for index in iter {
            mask.insert(index);
        }
        mask
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(ComponentIndex::get)).finish()
    }
}
