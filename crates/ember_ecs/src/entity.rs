use std::fmt;

/// An entity identifier. It's very cheap to copy (2x32-bit values).
///
/// The `index` names a slot in the [`crate::EntityManager`] slot table, and the `generation`
/// tells apart the logical entities that occupied that slot over time. Two ids are equal only if
/// both values match, so an id issued before its slot was recycled never compares equal to an id
/// issued after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    /// The entity's slot within the manager's slot table.
    pub index: u32,
    /// The slot's generation at the time this id was issued.
    pub generation: u32,
}

impl EntityId {
    /// Sentinel id that never refers to a live entity.
    ///
    /// Managers never hand out slot `u32::MAX`, so this id is stale in every manager.
    pub const INVALID: EntityId = EntityId {
        index: u32::MAX,
        generation: u32::MAX,
    };

    /// Creates an id from its raw parts.
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns `true` for [`EntityId::INVALID`].
    #[inline]
    pub const fn is_invalid(self) -> bool {
        self.index == u32::MAX && self.generation == u32::MAX
    }

    /// Packs the id into a 64-bit value, generation in the upper half.
    #[inline]
    pub const fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    /// Inverse of [`EntityId::to_bits`].
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invalid() {
            write!(f, "entity(invalid)")
        } else {
            write!(f, "entity({}v{})", self.index, self.generation)
        }
    }
}
