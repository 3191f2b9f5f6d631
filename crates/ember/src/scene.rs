//! Scene graph bookkeeping and draw list generation
//!
//! The [`SceneGraph`] lives inside the entity store as a listener, tracking when each entity
//! entered the scene. Every frame, [`SceneGraph::visit`] walks the visible entities and produces a
//! flat list of [`DrawCommand`]s, with parent transforms already applied.

use ahash::AHashMap;
use ember_ecs::components::world_transform;
use ember_ecs::{
    impl_listener_any, Component, EntityCreatedEvent, EntityDestroyedEvent, EntityId,
    EntityListener, EntityManager,
};
use glam::Mat4;
use log::*;

/// Marks an entity as drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderComponent {
    pub mesh: &'static str,
    pub visible: bool,
}

impl Component for RenderComponent {}

impl RenderComponent {
    pub fn new(mesh: &'static str) -> Self {
        Self {
            mesh,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SceneNode {
    attached_at: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub entity: EntityId,
    pub mesh: &'static str,
    pub transform: Mat4,
    /// Frames since the entity entered the scene.
    pub age: u64,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: AHashMap<EntityId, SceneNode>,
    frame: u64,
    attached: u64,
    detached: u64,
}

impl EntityListener for SceneGraph {
    fn on_entity_created(&mut self, _: &EntityManager, event: &EntityCreatedEvent) {
        let node = SceneNode {
            attached_at: self.frame,
        };
        if self.nodes.insert(event.entity, node).is_some() {
            // Generations make ids unique, so this only happens if events were dropped
            warn!("{} entered the scene twice", event.entity);
        }
        self.attached += 1;
    }

    fn on_entity_destroyed(&mut self, _: &EntityManager, event: &EntityDestroyedEvent) {
        if self.nodes.remove(&event.entity).is_some() {
            self.detached += 1;
        }
    }

    impl_listener_any!();
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    /// Amount of entities currently in the scene.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn attached(&self) -> u64 {
        self.attached
    }

    pub fn detached(&self) -> u64 {
        self.detached
    }

    /// Collects draw commands of all visible entities, ordered by mesh.
    ///
    /// Entities without a transform are skipped.
    pub fn visit(&self, world: &EntityManager) -> Vec<DrawCommand> {
        let mut commands: Vec<_> = world
            .iter_with::<RenderComponent>()
            .filter(|(_, render)| render.visible)
            .filter_map(|(entity, render)| {
                let transform = world_transform(world, entity)?;
                let age = self
                    .nodes
                    .get(&entity)
                    .map_or(0, |node| self.frame.saturating_sub(node.attached_at));
                Some(DrawCommand {
                    entity,
                    mesh: render.mesh,
                    transform: transform.into(),
                    age,
                })
            })
            .collect();

        commands.sort_by(|a, b| a.mesh.cmp(b.mesh).then(a.entity.cmp(&b.entity)));
        commands
    }
}
