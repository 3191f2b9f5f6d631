//! The frame loop
//!
//! Every frame runs the systems in a fixed order:
//!  * behaviour trees pick what each wanderer does
//!  * navigation moves agents along their paths
//!  * expired wanderers are destroyed and replaced
//!  * the scene graph produces the frame's draw list
//!
//! Destruction is deferred through a [`CommandQueue`], since expiry is detected while iterating
//! over the world.

use crate::{
    ai::{self, behaviour::BehaviourTree, BehaviourStats, Energy, Wanderer},
    config::EngineConfig,
    navmesh::{NavAgent, Navigation},
    scene::{RenderComponent, SceneGraph},
};
use ember_ecs::{
    components::TransformComponent, CommandQueue, Component, EntityId, EntityManager,
    ListenerHandle,
};
use ember_utils::{ok, AnyResult, AnyhowResultExt};
use glam::Vec3;
use log::*;

/// Frames left until the entity is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime {
    pub frames_left: u32,
}

impl Component for Lifetime {}

const WANDER_RADIUS: f32 = 12.0;
const WANDER_SPEED: f32 = 3.0;

/// What happened during a single frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    pub behaviour: BehaviourStats,
    pub moved: u32,
    pub expired: u32,
    pub spawned: u32,
    pub drawn: u32,
}

/// Totals of a whole [`Engine::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub frames: u64,
    pub spawned: u64,
    pub expired: u64,
    pub peak_entities: usize,
    pub draws: u64,
}

pub struct Engine {
    config: EngineConfig,
    world: EntityManager,
    scene: ListenerHandle,
    navigation: Navigation,
    commands: CommandQueue,
    frame: u64,
    spawned: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> AnyResult<Self> {
        config.validate().otherwise("invalid engine configuration")?;

        let mut world = EntityManager::with_config(config.world);
        register_components(&mut world)?;

        let navigation = Navigation::new();
        let scene = world.subscribe(SceneGraph::new());
        world.subscribe(navigation.listener());

        let mut engine = Self {
            config,
            world,
            scene,
            navigation,
            commands: CommandQueue::new(),
            frame: 0,
            spawned: 0,
        };
        engine.respawn();

        info!(
            "Engine initialized with {} wanderers and {} components",
            engine.world.len(),
            engine.world.registry().len()
        );
        Ok(engine)
    }

    pub fn world(&self) -> &EntityManager {
        &self.world
    }

    pub fn scene(&self) -> &SceneGraph {
        self.world
            .listener::<SceneGraph>(self.scene)
            .expect("scene graph is subscribed")
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    /// Simulates a single frame.
    pub fn frame(&mut self) -> FrameReport {
        let frame = self.frame;
        self.world
            .listener_mut::<SceneGraph>(self.scene)
            .expect("scene graph is subscribed")
            .begin_frame(frame);

        let behaviour = ai::behaviour_system(&mut self.world);
        let moved = self.navigation.update(&mut self.world, self.config.time_step);

        let mut expired = 0;
        for (entity, lifetime) in self.world.iter_with_mut::<Lifetime>() {
            lifetime.frames_left = lifetime.frames_left.saturating_sub(1);
            if lifetime.frames_left == 0 {
                self.commands.destroy(entity);
                expired += 1;
            }
        }
        self.commands.apply(&mut self.world);

        let spawned = self.respawn();
        let drawn = self.scene().visit(&self.world).len() as u32;

        self.frame += 1;
        FrameReport {
            frame,
            behaviour,
            moved,
            expired,
            spawned,
            drawn,
        }
    }

    /// Runs all configured frames.
    pub fn run(&mut self) -> Summary {
        let mut summary = Summary::default();

        for _ in 0..self.config.frames {
            let report = self.frame();
            summary.frames += 1;
            summary.spawned += report.spawned as u64;
            summary.expired += report.expired as u64;
            summary.draws += report.drawn as u64;
            summary.peak_entities = summary.peak_entities.max(self.world.len());

            if report.frame % 60 == 0 {
                info!(
                    "Frame {}: {} entities, {} moving, {} resting, {} drawn",
                    report.frame,
                    self.world.len(),
                    report.moved,
                    report.behaviour.running,
                    report.drawn
                );
            }
        }

        summary
    }

    /// Spawns wanderers until the configured population is reached.
    fn respawn(&mut self) -> u32 {
        let mut count = 0;
        while self.world.len() < self.config.population as usize {
            let entity = self.spawn_wanderer();
            trace!("Spawned wanderer {entity}");
            count += 1;
        }
        count
    }

    fn spawn_wanderer(&mut self) -> EntityId {
        let salt = self.spawned;
        self.spawned += 1;

        let angle = salt as f32 * 0.7;
        let origin = Vec3::new(angle.cos(), 0.0, angle.sin()) * (WANDER_RADIUS * 0.5);

        self.world
            .build_entity()
            .with(ai::wanderer_tree())
            .with(Energy(40.0 + (salt % 5) as f32 * 15.0))
            .with(Wanderer {
                waypoints_visited: 0,
                radius: WANDER_RADIUS,
            })
            .with(NavAgent::new(WANDER_SPEED))
            .with(TransformComponent::from_translation(origin))
            .with(RenderComponent::new("wanderer"))
            .with(Lifetime {
                frames_left: self.config.lifetime,
            })
            .finish()
    }
}

fn register_components(world: &mut EntityManager) -> AnyResult {
    world
        .register::<BehaviourTree>()
        .otherwise("registering behaviour trees")?;
    world.register::<Energy>().otherwise("registering energy")?;
    world
        .register::<Wanderer>()
        .otherwise("registering wanderers")?;
    world
        .register::<NavAgent>()
        .otherwise("registering navigation agents")?;
    world
        .register::<TransformComponent>()
        .otherwise("registering transforms")?;
    world
        .register::<RenderComponent>()
        .otherwise("registering render components")?;
    world
        .register::<Lifetime>()
        .otherwise("registering lifetimes")?;
    ok()
}
