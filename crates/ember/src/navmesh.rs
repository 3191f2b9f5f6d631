//! Navigation agents
//!
//! Paths are owned by a [`PathStore`] outside of the entity store, keyed by [`EntityId`]. The
//! [`NavMeshListener`] releases an agent's path when its entity is destroyed, before the slot can
//! be handed out to another entity.

use ahash::AHashMap;
use ember_ecs::components::TransformComponent;
use ember_ecs::{
    impl_listener_any, Component, EntityDestroyedEvent, EntityId, EntityListener, EntityManager,
};
use glam::{Vec3, Vec3A};
use log::*;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

/// Maximum distance between two consecutive path waypoints.
const WAYPOINT_SPACING: f32 = 2.5;

/// Distance at which a waypoint counts as reached.
const ARRIVAL_EPSILON: f32 = 1e-3;

/// Makes an entity move towards `target`. Requires a [`TransformComponent`] on the same entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavAgent {
    pub target: Vec3,
    /// Movement speed, in units per second.
    pub speed: f32,
    pub arrived: bool,
    /// Halted agents keep their path, but don't move.
    pub halted: bool,
}

impl Component for NavAgent {}

impl NavAgent {
    /// Creates an agent with no pending target.
    pub fn new(speed: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            speed,
            arrived: true,
            halted: false,
        }
    }
}

/// Waypoints of a single agent, stored back to front, so that the next waypoint is the last one.
pub type Path = SmallVec<[Vec3; 8]>;

#[derive(Debug, Default)]
pub struct PathStore {
    paths: AHashMap<EntityId, Path>,
    planned: u64,
    released: u64,
}

impl PathStore {
    /// Plans a straight path from `from` to `to`, split into evenly spaced waypoints.
    pub fn plan(from: Vec3, to: Vec3) -> Path {
        let distance = from.distance(to);
        let steps = (distance / WAYPOINT_SPACING).ceil().max(1.0) as u32;
        (1..=steps)
            .rev()
            .map(|step| from.lerp(to, step as f32 / steps as f32))
            .collect()
    }

    pub fn get(&self, entity: EntityId) -> Option<&Path> {
        self.paths.get(&entity)
    }

    /// Drops the path of an agent, returning whether it had one.
    pub fn release(&mut self, entity: EntityId) -> bool {
        let released = self.paths.remove(&entity).is_some();
        if released {
            self.released += 1;
            trace!("Released path of {entity}");
        }
        released
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn planned(&self) -> u64 {
        self.planned
    }

    pub fn released(&self) -> u64 {
        self.released
    }
}

/// Releases path data of destroyed agents.
pub struct NavMeshListener {
    store: Rc<RefCell<PathStore>>,
}

impl EntityListener for NavMeshListener {
    fn on_entity_destroyed(&mut self, world: &EntityManager, event: &EntityDestroyedEvent) {
        if world.has::<NavAgent>(event.entity) {
            self.store.borrow_mut().release(event.entity);
        }
    }

    impl_listener_any!();
}

/// The navigation system.
#[derive(Default)]
pub struct Navigation {
    store: Rc<RefCell<PathStore>>,
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a listener that keeps this system's paths in sync with entity destruction.
    pub fn listener(&self) -> NavMeshListener {
        NavMeshListener {
            store: self.store.clone(),
        }
    }

    pub fn store(&self) -> std::cell::Ref<'_, PathStore> {
        self.store.borrow()
    }

    /// Moves every active agent along its path. Returns the amount of agents that moved.
    pub fn update(&self, world: &mut EntityManager, dt: f32) -> u32 {
        let mut store = self.store.borrow_mut();
        let mut moved = 0;

        for entity in world.live_ids() {
            if !world.has::<NavAgent>(entity) || !world.has::<TransformComponent>(entity) {
                continue;
            }

            let agent = *world.get::<NavAgent>(entity);
            if agent.arrived || agent.halted {
                continue;
            }

            let position = Vec3::from(world.get::<TransformComponent>(entity).position());

            let stale_path = store
                .paths
                .get(&entity)
                .map_or(true, |path| path.first() != Some(&agent.target));
            if stale_path {
                let path = PathStore::plan(position, agent.target);
                store.paths.insert(entity, path);
                store.planned += 1;
            }

            let Some(path) = store.paths.get_mut(&entity) else {
                continue;
            };

            let mut budget = agent.speed * dt;
            let mut position = position;
            while let Some(&waypoint) = path.last() {
                let distance = position.distance(waypoint);
                if distance <= budget + ARRIVAL_EPSILON {
                    budget = (budget - distance).max(0.0);
                    position = waypoint;
                    path.pop();
                } else {
                    position += (waypoint - position) / distance * budget;
                    break;
                }
            }

            world.get_mut::<TransformComponent>(entity).local.translation = Vec3A::from(position);
            moved += 1;

            if path.is_empty() {
                store.paths.remove(&entity);
                world.get_mut::<NavAgent>(entity).arrived = true;
            }
        }

        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (EntityManager, Navigation) {
        let mut world = EntityManager::new();
        world.register::<NavAgent>().unwrap();
        world.register::<TransformComponent>().unwrap();

        let navigation = Navigation::new();
        world.subscribe(navigation.listener());
        (world, navigation)
    }

    fn agent(world: &mut EntityManager, target: Vec3, speed: f32) -> EntityId {
        world
            .build_entity()
            .with_default::<TransformComponent>()
            .with(NavAgent {
                target,
                arrived: false,
                ..NavAgent::new(speed)
            })
            .finish()
    }

    #[test]
    fn plan_spaces_waypoints() {
        let path = PathStore::plan(Vec3::ZERO, Vec3::X * 10.0);
        assert_eq!(path.len(), 4);
        assert_eq!(path.first(), Some(&(Vec3::X * 10.0)));
        assert_eq!(path.last(), Some(&(Vec3::X * 2.5)));

        let short = PathStore::plan(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(short.len(), 1);
    }

    #[test]
    fn agents_reach_their_target() {
        let (mut world, navigation) = setup();
        let entity = agent(&mut world, Vec3::new(6.0, 0.0, 0.0), 4.0);

        assert_eq!(navigation.update(&mut world, 1.0), 1);
        assert_eq!(navigation.store().planned(), 1);
        let position = world.get::<TransformComponent>(entity).position();
        assert!((position.x - 4.0).abs() < 1e-4);
        assert!(!world.get::<NavAgent>(entity).arrived);

        navigation.update(&mut world, 1.0);
        assert!(world.get::<NavAgent>(entity).arrived);
        assert_eq!(world.get::<TransformComponent>(entity).position(), Vec3A::X * 6.0);
        assert!(navigation.store().is_empty());

        // Arrived agents stay put
        assert_eq!(navigation.update(&mut world, 1.0), 0);
    }

    #[test]
    fn halted_agents_do_not_move() {
        let (mut world, navigation) = setup();
        let entity = agent(&mut world, Vec3::X * 6.0, 4.0);
        world.get_mut::<NavAgent>(entity).halted = true;

        assert_eq!(navigation.update(&mut world, 1.0), 0);
        assert_eq!(world.get::<TransformComponent>(entity).position(), Vec3A::ZERO);
    }

    #[test]
    fn retargeting_replans() {
        let (mut world, navigation) = setup();
        let entity = agent(&mut world, Vec3::X * 100.0, 1.0);
        navigation.update(&mut world, 1.0);
        world.get_mut::<NavAgent>(entity).target = Vec3::Z * 100.0;
        navigation.update(&mut world, 1.0);
        assert_eq!(navigation.store().planned(), 2);
        assert_eq!(
            navigation.store().get(entity).and_then(|path| path.first()),
            Some(&(Vec3::Z * 100.0))
        );
    }

    #[test]
    fn destroyed_agents_release_their_path() {
        let (mut world, navigation) = setup();
        let entity = agent(&mut world, Vec3::X * 100.0, 1.0);
        let bystander = world.create_entity();

        navigation.update(&mut world, 1.0);
        assert_eq!(navigation.store().len(), 1);

        world.destroy_entity(bystander);
        assert_eq!(navigation.store().released(), 0);

        world.destroy_entity(entity);
        assert!(navigation.store().is_empty());
        assert_eq!(navigation.store().released(), 1);
    }
}
