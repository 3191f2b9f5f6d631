//! Entity AI driven by behaviour trees

use crate::navmesh::NavAgent;
use ember_ecs::{Component, EntityManager, EntityMut};
use glam::Vec3;
use log::*;

pub mod behaviour;
use behaviour::{BehaviourNode, BehaviourTree, Status};

/// Stamina of a wandering entity. Travelling drains it, resting restores it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Energy(pub f32);

impl Component for Energy {}

/// Per-entity wandering state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Wanderer {
    pub waypoints_visited: u32,
    pub radius: f32,
}

impl Component for Wanderer {}

const EXHAUSTED_BELOW: f32 = 20.0;
const REST_GAIN: f32 = 15.0;
const TRAVEL_COST: f32 = 1.0;
const MAX_ENERGY: f32 = 100.0;

fn is_exhausted(entity: &mut EntityMut<'_>) -> Status {
    if entity.get::<Energy>().0 < EXHAUSTED_BELOW {
        Status::Success
    } else {
        Status::Failure
    }
}

fn rest(entity: &mut EntityMut<'_>) -> Status {
    entity.get_mut::<NavAgent>().halted = true;
    let energy = entity.get_mut::<Energy>();
    energy.0 = (energy.0 + REST_GAIN).min(MAX_ENERGY);
    if energy.0 >= MAX_ENERGY {
        entity.get_mut::<NavAgent>().halted = false;
        Status::Success
    } else {
        Status::Running
    }
}

fn has_arrived(entity: &mut EntityMut<'_>) -> Status {
    if entity.get::<NavAgent>().arrived {
        Status::Success
    } else {
        Status::Failure
    }
}

fn pick_waypoint(entity: &mut EntityMut<'_>) -> Status {
    let salt = entity.id().index as f32;
    let wanderer = entity.get_mut::<Wanderer>();
    wanderer.waypoints_visited += 1;

    let angle = wanderer.waypoints_visited as f32 * 1.3 + salt;
    let target = Vec3::new(angle.cos(), 0.0, angle.sin()) * wanderer.radius;

    let agent = entity.get_mut::<NavAgent>();
    agent.target = target;
    agent.arrived = false;
    Status::Success
}

fn travel(entity: &mut EntityMut<'_>) -> Status {
    entity.get_mut::<Energy>().0 -= TRAVEL_COST;
    Status::Success
}

/// Builds the tree of an entity wandering between waypoints, resting whenever it's exhausted.
///
/// Requires [`Energy`], [`Wanderer`] and [`NavAgent`] on the entity.
pub fn wanderer_tree() -> BehaviourTree {
    BehaviourTree::new(BehaviourNode::selector([
        BehaviourNode::sequence([
            BehaviourNode::action("is_exhausted", is_exhausted),
            BehaviourNode::action("rest", rest),
        ]),
        BehaviourNode::sequence([
            BehaviourNode::action("has_arrived", has_arrived),
            BehaviourNode::action("pick_waypoint", pick_waypoint),
        ]),
        BehaviourNode::action("travel", travel),
    ]))
}

/// Outcome counts of a single [`behaviour_system`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BehaviourStats {
    pub success: u32,
    pub failure: u32,
    pub running: u32,
}

/// Ticks the behaviour tree of every live entity that has one.
pub fn behaviour_system(world: &mut EntityManager) -> BehaviourStats {
    let mut stats = BehaviourStats::default();

    for entity in world.live_ids() {
        if !world.has::<BehaviourTree>(entity) {
            continue;
        }

        // The tree can't stay in the world while it mutates its own entity
        let mut tree = world.take::<BehaviourTree>(entity);
        let status = tree.tick(&mut world.entity_mut(entity));

        if world.is_stale(entity) {
            warn!("{entity} was destroyed by its own behaviour tree");
        } else {
            world.add(entity, tree);
        }

        match status {
            Status::Success => stats.success += 1,
            Status::Failure => stats.failure += 1,
            Status::Running => stats.running += 1,
        }
    }

    stats
}
