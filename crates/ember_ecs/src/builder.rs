use crate::{Component, EntityId, EntityManager};

/// Creates an entity and attaches components to it in one expression.
///
/// ## Example
/// ```
/// use ember_ecs::{Component, EntityBuilder, EntityManager};
///
/// struct Name(&'static str);
/// impl Component for Name {}
///
/// let mut world = EntityManager::new();
/// world.register::<Name>().unwrap();
///
/// let entity = EntityBuilder::new(&mut world).with(Name("lamp")).finish();
/// assert_eq!(world.get::<Name>(entity).0, "lamp");
/// ```
pub struct EntityBuilder<'w> {
    world: &'w mut EntityManager,
    entity: EntityId,
}

impl<'w> EntityBuilder<'w> {
    pub fn new(world: &'w mut EntityManager) -> Self {
        Self {
            entity: world.create_entity(),
            world,
        }
    }

    pub fn with(self, value: impl Component) -> Self {
        self.world.add(self.entity, value);
        self
    }

    pub fn with_default<T: Component + Default>(self) -> Self {
        self.with(T::default())
    }

    pub fn id(&self) -> EntityId {
        self.entity
    }

    pub fn finish(self) -> EntityId {
        self.entity
    }
}

impl EntityManager {
    /// Shorthand for [`EntityBuilder::new`].
    pub fn build_entity(&mut self) -> EntityBuilder<'_> {
        EntityBuilder::new(self)
    }
}
