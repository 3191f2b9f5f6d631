use crate::{Component, EntityId, EntityManager};
use log::*;
use std::any::type_name;

type DeferredFn = Box<dyn FnOnce(&mut EntityManager)>;

/// Records structural changes while the world is borrowed (e.g. during iteration), to be applied
/// once the borrow ends.
///
/// Component edits run first, in recording order. Destructions run last, as a single batch, and
/// skip ids that went stale in the meantime.
///
/// ## Example
/// ```
/// use ember_ecs::{CommandQueue, Component, EntityManager};
///
/// struct Health(i32);
/// impl Component for Health {}
///
/// let mut world = EntityManager::new();
/// world.register::<Health>().unwrap();
/// for hp in [10, 0, 5, 0] {
///     world.build_entity().with(Health(hp)).finish();
/// }
///
/// let mut commands = CommandQueue::new();
/// for (entity, health) in world.iter_with::<Health>() {
///     if health.0 <= 0 {
///         commands.destroy(entity);
///     }
/// }
/// commands.apply(&mut world);
/// assert_eq!(world.len(), 2);
/// ```
#[derive(Default)]
pub struct CommandQueue {
    edits: Vec<DeferredFn>,
    destroyed: Vec<EntityId>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues destruction of an entity. Queuing the same entity twice destroys it once.
    pub fn destroy(&mut self, entity: EntityId) {
        self.destroyed.push(entity);
    }

    /// Queues attaching a component.
    pub fn add<T: Component>(&mut self, entity: EntityId, value: T) {
        self.edits.push(Box::new(move |world| {
            if world.is_stale(entity) {
                warn!(
                    "Dropping deferred `{}` for stale {entity}",
                    type_name::<T>()
                );
                return;
            }
            world.add(entity, value);
        }));
    }

    /// Queues removal of a component. Missing components are ignored.
    pub fn remove<T: Component>(&mut self, entity: EntityId) {
        self.edits.push(Box::new(move |world| {
            if !world.is_stale(entity) && world.has::<T>(entity) {
                world.remove::<T>(entity);
            }
        }));
    }

    /// Queues an arbitrary world edit.
    pub fn push(&mut self, edit: impl FnOnce(&mut EntityManager) + 'static) {
        self.edits.push(Box::new(edit));
    }

    pub fn len(&self) -> usize {
        self.edits.len() + self.destroyed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty() && self.destroyed.is_empty()
    }

    /// Applies all queued commands, leaving the queue empty.
    pub fn apply(&mut self, world: &mut EntityManager) {
        if self.is_empty() {
            return;
        }
        trace!(
            "Applying {} deferred edits and {} destructions",
            self.edits.len(),
            self.destroyed.len()
        );

        for edit in self.edits.drain(..) {
            edit(world);
        }

        self.destroyed.sort_unstable();
        self.destroyed.dedup();
        let live = self
            .destroyed
            .drain(..)
            .filter(|&entity| !world.is_stale(entity))
            .collect::<Vec<_>>();
        world.destroy_entities(live);
    }
}
