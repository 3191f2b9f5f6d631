use crate::{Component, ComponentMask, EntityId, EntityManager};
use std::{fmt, ptr};

/// Read-only handle to a single entity inside an [`EntityManager`].
///
/// Two handles are equal if they point into the same manager and carry the same [`EntityId`],
/// generation included.
#[derive(Clone, Copy)]
pub struct Entity<'w> {
    world: &'w EntityManager,
    id: EntityId,
}

impl<'w> Entity<'w> {
    #[inline]
    pub(crate) fn new(world: &'w EntityManager, id: EntityId) -> Self {
        Self { world, id }
    }

    pub fn world(&self) -> &'w EntityManager {
        self.world
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn is_stale(&self) -> bool {
        self.world.is_stale(self.id)
    }

    #[inline]
    pub fn has<T: Component>(&self) -> bool {
        self.world.has::<T>(self.id)
    }

    #[inline]
    pub fn get<T: Component>(&self) -> &'w T {
        self.world.get(self.id)
    }

    #[inline]
    pub fn try_get<T: Component>(&self) -> Option<&'w T> {
        self.world.try_get(self.id)
    }

    pub fn mask(&self) -> ComponentMask {
        self.world.mask(self.id)
    }
}

impl PartialEq for Entity<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.world, other.world) && self.id == other.id
    }
}

impl Eq for Entity<'_> {}

impl fmt::Debug for Entity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Entity").field(&self.id).finish()
    }
}

/// Same as [`Entity`], but allows for mutation.
pub struct EntityMut<'w> {
    world: &'w mut EntityManager,
    id: EntityId,
}

impl<'w> EntityMut<'w> {
    #[inline]
    pub(crate) fn new(world: &'w mut EntityManager, id: EntityId) -> Self {
        Self { world, id }
    }

    pub fn world(&self) -> &EntityManager {
        self.world
    }

    pub fn world_mut(&mut self) -> &mut EntityManager {
        self.world
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Reborrows this handle as a read-only one.
    pub fn as_entity(&self) -> Entity<'_> {
        Entity::new(self.world, self.id)
    }

    #[inline]
    pub fn has<T: Component>(&self) -> bool {
        self.world.has::<T>(self.id)
    }

    #[inline]
    pub fn get<T: Component>(&self) -> &T {
        self.world.get(self.id)
    }

    #[inline]
    pub fn get_mut<T: Component>(&mut self) -> &mut T {
        self.world.get_mut(self.id)
    }

    #[inline]
    pub fn try_get<T: Component>(&self) -> Option<&T> {
        self.world.try_get(self.id)
    }

    #[inline]
    pub fn try_get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.world.try_get_mut(self.id)
    }

    pub fn add<T: Component>(&mut self, value: T) -> &mut T {
        self.world.add(self.id, value)
    }

    pub fn remove<T: Component>(&mut self) {
        self.world.remove::<T>(self.id)
    }

    pub fn take<T: Component>(&mut self) -> T {
        self.world.take(self.id)
    }

    /// Destroys the entity, consuming the handle.
    pub fn destroy(self) {
        self.world.destroy_entity(self.id)
    }
}

impl fmt::Debug for EntityMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityMut").field(&self.id).finish()
    }
}
