use crate::allocator::{ComponentAllocator, ErasedAllocator};
use crate::events::{EntityCreatedEvent, EntityDestroyedEvent, EventDispatcher};
use crate::{
    Component, ComponentIndex, ComponentMask, ComponentRegistry, Entity, EntityId, EntityMut,
    RegistryError,
};
use log::*;
use serde::Deserialize;
use std::any::type_name;
use std::{fmt, mem};

/// Amount of slots to grow by whenever the slot table runs out of space, unless configured
/// otherwise.
pub const ECS_GROW_AMOUNT: u32 = 50;

/// How the slot table (and every component allocator with it) grows once it's full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPolicy {
    /// Grow by a fixed amount of slots.
    Chunked(u32),
    /// Double the capacity.
    Doubling,
    /// Grow exactly to the required size.
    Exact,
}

impl GrowthPolicy {
    /// Picks the new capacity for a table of `current` slots that has to address `required`.
    pub fn next_capacity(self, current: usize, required: usize) -> usize {
        let proposed = match self {
            GrowthPolicy::Chunked(amount) => current.saturating_add(amount as usize),
            GrowthPolicy::Doubling => current.saturating_mul(2).max(4),
            GrowthPolicy::Exact => required,
        };
        proposed.max(required)
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        GrowthPolicy::Chunked(ECS_GROW_AMOUNT)
    }
}

/// Construction parameters of an [`EntityManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Amount of slots reserved up front.
    pub initial_capacity: u32,
    pub growth: GrowthPolicy,
}

/// The entity world. Sole owner of the slot table, the free list and every component allocator.
///
/// ## Slot table
/// Every slot has a generation, a component mask and a liveness flag, stored in parallel vectors.
/// A slot's generation starts at 0 and is bumped each time the slot is freed, which is what makes
/// ids of destroyed entities detectably stale. A slot whose generation can't be bumped anymore is
/// retired instead of being reused. The table grows monotonically and never shrinks.
///
/// ## Misuse
/// Accessing stale ids, adding a component twice, or reading a missing component are programmer
/// errors. With debug assertions they panic right away. Release builds skip the liveness and
/// mask checks; the storage stays memory safe, but the results are meaningless.
pub struct EntityManager {
    generations: Vec<u32>,
    masks: Vec<ComponentMask>,
    alive: Vec<bool>,

    /// Amount of slots handed out so far, live or free. Slots past it are reserved capacity.
    slot_count: u32,
    live_count: u32,
    free_indices: Vec<u32>,
    growth: GrowthPolicy,

    registry: ComponentRegistry,
    allocators: Vec<Box<dyn ErasedAllocator>>,

    pub(crate) dispatcher: EventDispatcher,
}

impl EntityManager {
    /// Creates a blank, empty world with default configuration.
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    pub fn with_config(config: WorldConfig) -> Self {
        let mut world = Self {
            generations: Vec::new(),
            masks: Vec::new(),
            alive: Vec::new(),
            slot_count: 0,
            live_count: 0,
            free_indices: Vec::new(),
            growth: config.growth,
            registry: ComponentRegistry::new(),
            allocators: Vec::new(),
            dispatcher: EventDispatcher::default(),
        };
        world.ensure_capacity(config.initial_capacity as usize);
        world
    }

    /// Registers a component type, creating its allocator. Registering a type twice is a no-op.
    pub fn register<T: Component>(&mut self) -> Result<ComponentIndex, RegistryError> {
        let index = self.registry.register::<T>()?;
        if index.get() == self.allocators.len() {
            self.allocators
                .push(Box::new(ComponentAllocator::<T>::with_capacity(self.capacity())));
            debug!("Created allocator for `{}` ({index})", type_name::<T>());
        }
        Ok(index)
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Allocates a new entity, reusing a free slot if there's one.
    ///
    /// ## Panics
    /// Panics when the 32-bit slot index space is exhausted.
    pub fn create_entity(&mut self) -> EntityId {
        let index = match self.free_indices.pop() {
            Some(index) => index,
            None => {
                let index = self.slot_count;
                assert!(index < u32::MAX, "ECS index overflow??");
                let required = index as usize + 1;
                if required > self.capacity() {
                    let capacity = self.growth.next_capacity(self.capacity(), required);
                    self.ensure_capacity(capacity);
                }
                self.slot_count += 1;
                index
            }
        };

        let slot = index as usize;
        debug_assert!(!self.alive[slot], "free slot {index} is marked as alive");
        debug_assert!(self.masks[slot].is_empty(), "free slot {index} has components");
        self.alive[slot] = true;
        self.live_count += 1;

        let entity = EntityId::new(index, self.generations[slot]);
        trace!("Created {entity}");

        let mut dispatcher = mem::take(&mut self.dispatcher);
        dispatcher.created(self, &EntityCreatedEvent { entity });
        self.dispatcher = dispatcher;

        entity
    }

    /// Destroys an entity, dropping all of its components and freeing its slot.
    ///
    /// Listeners are notified first, while the components are still attached.
    ///
    /// ## Panics
    /// With debug assertions, panics if `entity` is stale.
    pub fn destroy_entity(&mut self, entity: EntityId) {
        debug_assert!(
            !self.is_stale(entity),
            "attempting to destroy a stale entity ({entity})"
        );

        if self.is_stale(entity) {
            // The slot is either free or owned by a newer entity
            error!("Ignoring destruction of stale {entity}");
            return;
        }

        let mut dispatcher = mem::take(&mut self.dispatcher);
        dispatcher.destroyed(self, &EntityDestroyedEvent { entity });
        self.dispatcher = dispatcher;

        self.release_slot(entity.index);
        trace!("Destroyed {entity}");
    }

    /// Destroys a batch of entities, then sorts the free list so that the lowest free slots are
    /// reused first.
    pub fn destroy_entities(&mut self, entities: impl IntoIterator<Item = EntityId>) {
        let mut count = 0usize;
        for entity in entities {
            self.destroy_entity(entity);
            count += 1;
        }

        // Popped from the back, so keep it descending
        self.free_indices.sort_unstable_by(|a, b| b.cmp(a));
        debug!(
            "Destroyed a batch of {count} entities, {} free slots",
            self.free_indices.len()
        );
    }

    fn release_slot(&mut self, index: u32) {
        let slot = index as usize;
        for component in self.masks[slot].iter() {
            let allocator = &mut self.allocators[component.get()];
            trace!("Dropping `{}` of slot {index}", allocator.component_name());
            allocator.destroy(index);
        }
        self.masks[slot].clear();

        self.alive[slot] = false;
        self.live_count -= 1;

        // A wrapped generation would make ids from before the wrap valid again, so exhausted slots
        // are retired and never handed out
        match self.generations[slot].checked_add(1) {
            Some(generation) => {
                self.generations[slot] = generation;
                self.free_indices.push(index);
            }
            None => warn!("Retiring slot {index}, its generation counter is exhausted"),
        }
    }

    #[cfg(test)]
    pub(crate) fn set_generation(&mut self, index: u32, generation: u32) {
        self.generations[index as usize] = generation;
    }

    /// Checks whether `entity` no longer refers to a live entity. Safe to call with any id.
    #[inline]
    pub fn is_stale(&self, entity: EntityId) -> bool {
        match self.generations.get(entity.index as usize) {
            Some(&generation) => {
                generation != entity.generation || !self.alive[entity.index as usize]
            }
            None => true,
        }
    }

    /// Grows the slot table and every allocator so that `capacity` slots can be addressed.
    /// Existing slots keep their contents. Never shrinks.
    ///
    /// ## Panics
    /// Panics if `capacity` exceeds the 32-bit slot index space.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if capacity <= self.capacity() {
            return;
        }
        assert!(
            capacity <= u32::MAX as usize,
            "ECS capacity overflow ({capacity} slots)"
        );

        self.generations.resize(capacity, 0);
        self.masks.resize(capacity, ComponentMask::EMPTY);
        self.alive.resize(capacity, false);
        for allocator in &mut self.allocators {
            allocator.grow(capacity);
            debug_assert_eq!(allocator.capacity(), capacity);
        }

        debug!("Entity slot table grown to {capacity} slots");
    }

    /// Amount of addressable slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }

    /// Amount of slots handed out so far, including free ones.
    #[inline]
    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    /// Amount of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.live_count as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Amount of slots waiting for reuse.
    #[inline]
    pub fn free_count(&self) -> usize {
        self.free_indices.len()
    }

    #[inline]
    fn debug_check_alive(&self, entity: EntityId) {
        debug_assert!(
            !self.is_stale(entity),
            "invalid entity access ({entity} is stale)"
        );
    }

    fn allocator<T: Component>(&self, component: ComponentIndex) -> &ComponentAllocator<T> {
        self.allocators[component.get()]
            .try_cast()
            .expect("invalid internal ecs type mapping")
    }

    fn allocator_mut<T: Component>(
        &mut self,
        component: ComponentIndex,
    ) -> &mut ComponentAllocator<T> {
        self.allocators[component.get()]
            .try_cast_mut()
            .expect("invalid internal ecs type mapping")
    }

    /// Attaches a component to the specified entity, returning a reference to it.
    ///
    /// ## Panics
    ///  - if `T` was not registered
    ///  - with debug assertions, if the entity is stale or already has a `T`
    pub fn add<T: Component>(&mut self, entity: EntityId, value: T) -> &mut T {
        self.debug_check_alive(entity);
        let component = self.registry.expect_index::<T>();

        let mask = &mut self.masks[entity.index as usize];
        debug_assert!(
            !mask.contains(component),
            "{entity} already has component `{}`",
            type_name::<T>()
        );
        mask.insert(component);

        self.allocator_mut::<T>(component)
            .construct(entity.index, value)
    }

    /// Checks if the entity has a specified component. Unregistered types are never present.
    ///
    /// ## Panics
    /// With debug assertions, panics if the entity is stale.
    #[inline]
    pub fn has<T: Component>(&self, entity: EntityId) -> bool {
        self.debug_check_alive(entity);
        match self.registry.index_of::<T>() {
            Some(component) => self.masks[entity.index as usize].contains(component),
            None => false,
        }
    }

    /// Returns a reference to a component of the specified entity.
    ///
    /// ## Panics
    ///  - if `T` was not registered, or the component isn't present
    ///  - with debug assertions, if the entity is stale
    pub fn get<T: Component>(&self, entity: EntityId) -> &T {
        self.debug_check_alive(entity);
        let component = self.registry.expect_index::<T>();
        match self.allocator::<T>(component).get(entity.index) {
            Some(value) => value,
            None => missing_component::<T>(entity),
        }
    }

    /// Like [`EntityManager::get`], but returns a mutable reference.
    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> &mut T {
        self.debug_check_alive(entity);
        let component = self.registry.expect_index::<T>();
        match self.allocator_mut::<T>(component).get_mut(entity.index) {
            Some(value) => value,
            None => missing_component::<T>(entity),
        }
    }

    /// Fully checked version of [`EntityManager::get`]. Returns [`None`] if the entity is stale,
    /// `T` isn't registered, or the entity doesn't have it.
    pub fn try_get<T: Component>(&self, entity: EntityId) -> Option<&T> {
        if self.is_stale(entity) {
            return None;
        }
        let component = self.registry.index_of::<T>()?;
        self.allocator::<T>(component).get(entity.index)
    }

    /// Like [`EntityManager::try_get`], but returns a mutable reference.
    pub fn try_get_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        if self.is_stale(entity) {
            return None;
        }
        let component = self.registry.index_of::<T>()?;
        self.allocator_mut::<T>(component).get_mut(entity.index)
    }

    /// Detaches a component from the entity and returns it.
    ///
    /// ## Panics
    ///  - if `T` was not registered, or the component isn't present
    ///  - with debug assertions, if the entity is stale
    pub fn take<T: Component>(&mut self, entity: EntityId) -> T {
        self.debug_check_alive(entity);
        let component = self.registry.expect_index::<T>();
        self.masks[entity.index as usize].remove(component);
        match self.allocator_mut::<T>(component).take(entity.index) {
            Some(value) => value,
            None => missing_component::<T>(entity),
        }
    }

    /// Detaches and drops a component. See [`EntityManager::take`].
    pub fn remove<T: Component>(&mut self, entity: EntityId) {
        drop(self.take::<T>(entity));
    }

    /// Returns the set of components attached to an entity.
    ///
    /// ## Panics
    /// With debug assertions, panics if the entity is stale.
    pub fn mask(&self, entity: EntityId) -> ComponentMask {
        self.debug_check_alive(entity);
        self.masks[entity.index as usize]
    }

    /// Returns a read-only handle to an entity.
    ///
    /// ## Panics
    /// With debug assertions, panics if the entity is stale.
    pub fn entity(&self, entity: EntityId) -> Entity<'_> {
        self.debug_check_alive(entity);
        Entity::new(self, entity)
    }

    /// Returns a mutable handle to an entity.
    ///
    /// ## Panics
    /// With debug assertions, panics if the entity is stale.
    pub fn entity_mut(&mut self, entity: EntityId) -> EntityMut<'_> {
        self.debug_check_alive(entity);
        EntityMut::new(self, entity)
    }

    /// Iterates over live entities in ascending slot order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            world: self,
            next_index: 0,
        }
    }

    /// Like [`EntityManager::iter`], but yields bare ids.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.iter().map(|entity| entity.id())
    }

    /// Collects the ids of all live entities, for loops that need to mutate the world.
    pub fn live_ids(&self) -> Vec<EntityId> {
        self.ids().collect()
    }

    /// Iterates over live entities with component `T`.
    pub fn iter_with<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        let generations = &self.generations;
        self.registry
            .index_of::<T>()
            .map(|component| self.allocator::<T>(component).iter())
            .into_iter()
            .flatten()
            .map(move |(index, value)| {
                (EntityId::new(index, generations[index as usize]), value)
            })
    }

    /// Like [`EntityManager::iter_with`], but yields mutable references.
    pub fn iter_with_mut<T: Component>(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        let allocator = match self.registry.index_of::<T>() {
            Some(component) => Some(
                self.allocators[component.get()]
                    .try_cast_mut::<T>()
                    .expect("invalid internal ecs type mapping"),
            ),
            None => None,
        };
        let generations = &self.generations;

        allocator
            .into_iter()
            .flat_map(|allocator| allocator.iter_mut())
            .map(move |(index, value)| {
                (EntityId::new(index, generations[index as usize]), value)
            })
    }
}

#[cold]
#[track_caller]
fn missing_component<T: Component>(entity: EntityId) -> ! {
    panic!("{entity} has no component `{}`", type_name::<T>())
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityManager")
            .field("live", &self.live_count)
            .field("slots", &self.slot_count)
            .field("capacity", &self.capacity())
            .field("free", &self.free_indices.len())
            .field("components", &self.registry.len())
            .field("listeners", &self.dispatcher.len())
            .finish()
    }
}

/// Iterator over live entities of an [`EntityManager`], see [`EntityManager::iter`].
pub struct Iter<'w> {
    world: &'w EntityManager,
    next_index: u32,
}

impl<'w> Iterator for Iter<'w> {
    type Item = Entity<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < self.world.slot_count {
            let index = self.next_index;
            self.next_index += 1;

            if self.world.alive[index as usize] {
                let generation = self.world.generations[index as usize];
                return Some(Entity::new(self.world, EntityId::new(index, generation)));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.world.slot_count - self.next_index) as usize;
        (0, Some(remaining))
    }
}

impl<'w> IntoIterator for &'w EntityManager {
    type Item = Entity<'w>;
    type IntoIter = Iter<'w>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_COMPONENTS;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Health(i32);
    impl Component for Health {}

    /// Counts how many times a value of this component was dropped.
    struct Tracked(Rc<Cell<u32>>);
    impl Component for Tracked {}
    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn world() -> EntityManager {
        let mut world = EntityManager::new();
        world.register::<Position>().unwrap();
        world.register::<Health>().unwrap();
        world.register::<Tracked>().unwrap();
        world
    }

    #[test]
    fn created_indices_are_unique() {
        let mut world = world();
        let mut ids: Vec<_> = (0..500).map(|_| world.create_entity().index).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 500);
        assert_eq!(world.len(), 500);
        assert!(world.capacity() >= 500);
    }

    #[test]
    fn fresh_entities_are_not_stale() {
        let mut world = world();
        let entity = world.create_entity();
        assert!(!world.is_stale(entity));
        world.destroy_entity(entity);
        assert!(world.is_stale(entity));
    }

    #[test]
    fn reuse_bumps_generation() {
        let mut world = world();
        let a = world.create_entity();
        let b = world.create_entity();
        let c = world.create_entity();
        assert_eq!((a.index, b.index, c.index), (0, 1, 2));
        assert!([a, b, c].iter().all(|id| id.generation == 0));

        world.destroy_entity(b);
        let d = world.create_entity();
        assert_eq!(d.index, 1);
        assert_eq!(d.generation, 1);
        assert!(world.is_stale(b));
        assert!(!world.is_stale(d));
        assert_ne!(b, d);

        let live: Vec<_> = world.ids().collect();
        assert_eq!(live, [a, d, c]);
    }

    #[test]
    fn invalid_id_is_always_stale() {
        let mut world = world();
        assert!(world.is_stale(EntityId::INVALID));
        world.create_entity();
        assert!(world.is_stale(EntityId::INVALID));
        assert!(world.is_stale(EntityId::new(40, 0)));
    }

    #[test]
    fn component_round_trip() {
        let mut world = world();
        let entity = world.create_entity();

        world.add(entity, Position { x: 1.0, y: 2.0 });
        assert!(world.has::<Position>(entity));
        assert!(!world.has::<Health>(entity));
        assert_eq!(world.get::<Position>(entity), &Position { x: 1.0, y: 2.0 });

        world.get_mut::<Position>(entity).x = 5.0;
        assert_eq!(world.get::<Position>(entity).x, 5.0);

        world.remove::<Position>(entity);
        assert!(!world.has::<Position>(entity));
        assert_eq!(world.try_get::<Position>(entity), None);
    }

    #[test]
    fn add_returns_constructed_value() {
        let mut world = world();
        let entity = world.create_entity();
        world.add(entity, Health(10)).0 += 5;
        assert_eq!(*world.get::<Health>(entity), Health(15));
    }

    #[test]
    fn take_moves_component_out() {
        let mut world = world();
        let entity = world.create_entity();
        world.add(entity, Health(3));
        assert_eq!(world.take::<Health>(entity), Health(3));
        assert!(world.mask(entity).is_empty());

        // Can be attached again afterwards
        world.add(entity, Health(4));
        assert_eq!(world.get::<Health>(entity).0, 4);
    }

    #[test]
    fn destruction_drops_every_component_once() {
        let drops = Rc::new(Cell::new(0));
        let mut world = world();
        let entity = world.create_entity();
        let bystander = world.create_entity();

        world.add(entity, Tracked(drops.clone()));
        world.add(entity, Health(1));
        world.add(bystander, Tracked(drops.clone()));
        assert_eq!(world.mask(entity).len(), 2);

        world.destroy_entity(entity);
        assert_eq!(drops.get(), 1);

        // The slot comes back clean
        let reused = world.create_entity();
        assert_eq!(reused.index, entity.index);
        assert!(world.mask(reused).is_empty());
        assert!(!world.has::<Health>(reused));
        assert!(world.has::<Tracked>(bystander));

        drop(world);
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn iteration_skips_freed_slots() {
        let mut world = world();
        let ids: Vec<_> = (0..10).map(|_| world.create_entity()).collect();
        for &id in ids.iter().step_by(2) {
            world.destroy_entity(id);
        }

        let live: Vec<_> = world.iter().map(|entity| entity.id()).collect();
        assert_eq!(live, ids.iter().copied().skip(1).step_by(2).collect::<Vec<_>>());
        assert_eq!(world.len(), 5);

        for entity in &world {
            assert!(entity.id().index % 2 == 1);
        }
    }

    #[test]
    fn ensure_capacity_preserves_contents() {
        let mut world = world();
        let entity = world.create_entity();
        world.add(entity, Position { x: 3.0, y: 4.0 });
        let capacity = world.capacity();

        world.ensure_capacity(capacity + 1000);
        assert_eq!(world.capacity(), capacity + 1000);
        assert_eq!(world.get::<Position>(entity), &Position { x: 3.0, y: 4.0 });
        assert_eq!(world.slot_count(), 1);

        // Shrinking requests are ignored
        world.ensure_capacity(1);
        assert_eq!(world.capacity(), capacity + 1000);
    }

    #[test]
    fn late_registration_covers_existing_slots() {
        #[derive(Debug, PartialEq)]
        struct Late(u8);
        impl Component for Late {}

        let mut world = world();
        let entities: Vec<_> = (0..60).map(|_| world.create_entity()).collect();
        world.register::<Late>().unwrap();
        world.add(entities[59], Late(1));
        assert_eq!(world.get::<Late>(entities[59]), &Late(1));
    }

    #[test]
    fn growth_policies() {
        assert_eq!(GrowthPolicy::Chunked(50).next_capacity(0, 1), 50);
        assert_eq!(GrowthPolicy::Chunked(0).next_capacity(10, 11), 11);
        assert_eq!(GrowthPolicy::Doubling.next_capacity(0, 1), 4);
        assert_eq!(GrowthPolicy::Doubling.next_capacity(16, 17), 32);
        assert_eq!(GrowthPolicy::Exact.next_capacity(16, 17), 17);
        assert_eq!(GrowthPolicy::Exact.next_capacity(16, 40), 40);
    }

    #[test]
    fn config_is_applied() {
        let mut world = EntityManager::with_config(WorldConfig {
            initial_capacity: 8,
            growth: GrowthPolicy::Exact,
        });
        assert_eq!(world.capacity(), 8);
        for _ in 0..9 {
            world.create_entity();
        }
        assert_eq!(world.capacity(), 9);
    }

    #[test]
    fn batch_destruction_reuses_lowest_slots_first() {
        let mut world = world();
        let ids: Vec<_> = (0..6).map(|_| world.create_entity()).collect();
        world.destroy_entities([ids[1], ids[4], ids[2]]);
        assert_eq!(world.free_count(), 3);

        let reused: Vec<_> = (0..3).map(|_| world.create_entity().index).collect();
        assert_eq!(reused, [1, 2, 4]);
    }

    #[test]
    fn typed_iteration() {
        let mut world = world();
        let a = world.create_entity();
        let b = world.create_entity();
        let c = world.create_entity();
        world.add(a, Health(1));
        world.add(c, Health(3));
        world.add(b, Position { x: 0.0, y: 0.0 });

        for (_, health) in world.iter_with_mut::<Health>() {
            health.0 *= 10;
        }

        let found: Vec<_> = world
            .iter_with::<Health>()
            .map(|(id, health)| (id, health.0))
            .collect();
        assert_eq!(found, [(a, 10), (c, 30)]);

        world.destroy_entity(a);
        assert_eq!(world.iter_with::<Health>().count(), 1);
    }

    #[test]
    fn unregistered_types_are_absent() {
        struct Unknown;
        impl Component for Unknown {}

        let mut world = world();
        let entity = world.create_entity();
        assert!(!world.has::<Unknown>(entity));
        assert!(world.try_get::<Unknown>(entity).is_none());
        assert_eq!(world.iter_with::<Unknown>().count(), 0);
    }

    #[test]
    #[should_panic(expected = "was not registered")]
    fn adding_unregistered_type_panics() {
        struct Unknown;
        impl Component for Unknown {}

        let mut world = world();
        let entity = world.create_entity();
        world.add(entity, Unknown);
    }

    #[test]
    #[should_panic(expected = "has no component")]
    fn getting_missing_component_panics() {
        let mut world = world();
        let entity = world.create_entity();
        world.get::<Health>(entity);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "already has component")]
    fn double_add_is_misuse() {
        let mut world = world();
        let entity = world.create_entity();
        world.add(entity, Health(1));
        world.add(entity, Health(2));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "is stale")]
    fn has_on_stale_entity_is_misuse() {
        let mut world = world();
        let entity = world.create_entity();
        world.destroy_entity(entity);
        world.create_entity();
        world.has::<Health>(entity);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "stale entity")]
    fn double_destroy_is_misuse() {
        let mut world = world();
        let entity = world.create_entity();
        world.destroy_entity(entity);
        world.destroy_entity(entity);
    }

    #[test]
    #[should_panic(expected = "has no component")]
    fn removing_missing_component_is_misuse() {
        let mut world = world();
        let entity = world.create_entity();
        world.add(entity, Health(1));
        world.remove::<Position>(entity);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "is stale")]
    fn get_on_stale_entity_is_misuse() {
        let mut world = world();
        let entity = world.create_entity();
        world.add(entity, Health(1));
        world.destroy_entity(entity);
        let reused = world.create_entity();
        world.add(reused, Health(2));
        world.get::<Health>(entity);
    }

    #[test]
    fn registration_past_the_limit_fails() {
        struct Numbered<const N: usize>;
        impl<const N: usize> Component for Numbered<N> {}

        macro_rules! register_numbered {
            ($world:expr; $($n:literal)*) => {
                $( $world.register::<Numbered<$n>>().unwrap(); )*
            };
        }

        let mut world = EntityManager::new();
        register_numbered!(world;
            0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31
            32 33 34 35 36 37 38 39 40 41 42 43 44 45 46 47 48 49 50 51 52 53 54 55 56 57 58 59
            60 61 62 63
        );
        assert_eq!(world.registry().len(), MAX_COMPONENTS);
        assert_eq!(world.allocators.len(), MAX_COMPONENTS);

        assert!(matches!(
            world.register::<Health>(),
            Err(RegistryError::TooManyComponents { .. })
        ));
        assert_eq!(world.allocators.len(), MAX_COMPONENTS);
        let entity = world.create_entity();
        assert!(!world.has::<Health>(entity));
    }

    #[test]
    fn exhausted_slots_are_retired() {
        let mut world = world();
        let first = world.create_entity();
        world.destroy_entity(first);
        world.set_generation(first.index, u32::MAX - 1);

        let second = world.create_entity();
        assert_eq!(second, EntityId::new(0, u32::MAX - 1));
        world.destroy_entity(second);

        let last = world.create_entity();
        assert_eq!(last, EntityId::new(0, u32::MAX));
        world.destroy_entity(last);
        assert_eq!(world.free_count(), 0);

        // Slot 0 is never handed out again, so none of its old ids can come back to life
        let fresh = world.create_entity();
        assert_eq!(fresh.index, 1);
        for old in [first, second, last] {
            assert!(world.is_stale(old));
        }
        assert_eq!(world.ids().collect::<Vec<_>>(), [fresh]);
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn stale_destroy_spares_the_new_occupant() {
        let mut world = world();
        let entity = world.create_entity();
        world.destroy_entity(entity);
        let reused = world.create_entity();
        assert_eq!(reused.index, entity.index);

        // Release builds ignore the stale id, debug builds catch it
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            world.destroy_entity(entity);
        }));
        assert_eq!(result.is_err(), cfg!(debug_assertions));
        assert!(!world.is_stale(reused));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn debug_output() {
        let mut world = world();
        world.create_entity();
        let text = format!("{world:?}");
        assert!(text.contains("live: 1"));
        assert!(text.contains("components: 3"));
    }
}
