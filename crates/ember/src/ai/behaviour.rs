//! Behaviour trees
//!
//! A tree is a plain [`BehaviourNode`] value, stored on an entity as a [`BehaviourTree`]
//! component and evaluated once per frame by [`BehaviourTree::tick`]. Composite nodes remember
//! which child was running, so a child returning [`Status::Running`] resumes on the next tick
//! instead of restarting the whole composite.

use ember_ecs::{Component, EntityMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
    Running,
}

/// Leaf behaviour, operating on the entity the tree belongs to.
pub type ActionFn = fn(&mut EntityMut<'_>) -> Status;

pub struct Composite {
    children: Vec<BehaviourNode>,
    running: usize,
}

pub enum BehaviourNode {
    /// Runs children in order until one fails.
    Sequence(Composite),
    /// Runs children in order until one succeeds.
    Selector(Composite),
    /// Runs the child until it succeeded `count` times, failing as soon as the child fails.
    Loop {
        child: Box<BehaviourNode>,
        count: u32,
        completed: u32,
    },
    /// Swaps the child's success and failure.
    Invert(Box<BehaviourNode>),
    Action {
        name: &'static str,
        run: ActionFn,
    },
}

impl BehaviourNode {
    pub fn sequence(children: impl IntoIterator<Item = BehaviourNode>) -> Self {
        BehaviourNode::Sequence(Composite {
            children: children.into_iter().collect(),
            running: 0,
        })
    }

    pub fn selector(children: impl IntoIterator<Item = BehaviourNode>) -> Self {
        BehaviourNode::Selector(Composite {
            children: children.into_iter().collect(),
            running: 0,
        })
    }

    pub fn repeat(count: u32, child: BehaviourNode) -> Self {
        BehaviourNode::Loop {
            child: Box::new(child),
            count,
            completed: 0,
        }
    }

    pub fn invert(child: BehaviourNode) -> Self {
        BehaviourNode::Invert(Box::new(child))
    }

    pub fn action(name: &'static str, run: ActionFn) -> Self {
        BehaviourNode::Action { name, run }
    }

    /// Name of the action node, if this is one.
    pub fn action_name(&self) -> Option<&'static str> {
        match self {
            BehaviourNode::Action { name, .. } => Some(*name),
            _ => None,
        }
    }
}

/// Evaluates a node against an entity.
pub fn evaluate(node: &mut BehaviourNode, entity: &mut EntityMut<'_>) -> Status {
    match node {
        BehaviourNode::Sequence(composite) => {
            while let Some(child) = composite.children.get_mut(composite.running) {
                match evaluate(child, entity) {
                    Status::Success => composite.running += 1,
                    Status::Failure => {
                        composite.running = 0;
                        return Status::Failure;
                    }
                    Status::Running => return Status::Running,
                }
            }
            composite.running = 0;
            Status::Success
        }

        BehaviourNode::Selector(composite) => {
            while let Some(child) = composite.children.get_mut(composite.running) {
                match evaluate(child, entity) {
                    Status::Success => {
                        composite.running = 0;
                        return Status::Success;
                    }
                    Status::Failure => composite.running += 1,
                    Status::Running => return Status::Running,
                }
            }
            composite.running = 0;
            Status::Failure
        }

        BehaviourNode::Loop {
            child,
            count,
            completed,
        } => {
            while *completed < *count {
                match evaluate(child, entity) {
                    Status::Success => *completed += 1,
                    Status::Failure => {
                        *completed = 0;
                        return Status::Failure;
                    }
                    Status::Running => return Status::Running,
                }
            }
            *completed = 0;
            Status::Success
        }

        BehaviourNode::Invert(child) => match evaluate(child, entity) {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
            Status::Running => Status::Running,
        },

        BehaviourNode::Action { run, .. } => run(entity),
    }
}

/// Behaviour tree attached to an entity.
pub struct BehaviourTree {
    pub root: BehaviourNode,
    pub last_status: Option<Status>,
}

impl Component for BehaviourTree {}

impl BehaviourTree {
    pub fn new(root: BehaviourNode) -> Self {
        Self {
            root,
            last_status: None,
        }
    }

    pub fn tick(&mut self, entity: &mut EntityMut<'_>) -> Status {
        let status = evaluate(&mut self.root, entity);
        self.last_status = Some(status);
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ecs::EntityManager;

    /// Log of executed actions, stored on the entity itself.
    #[derive(Default)]
    struct Trace(Vec<&'static str>);
    impl Component for Trace {}

    /// Amount of ticks the `slow` action keeps running for.
    struct Countdown(u32);
    impl Component for Countdown {}

    fn succeed(entity: &mut EntityMut<'_>) -> Status {
        entity.get_mut::<Trace>().0.push("succeed");
        Status::Success
    }

    fn fail(entity: &mut EntityMut<'_>) -> Status {
        entity.get_mut::<Trace>().0.push("fail");
        Status::Failure
    }

    fn slow(entity: &mut EntityMut<'_>) -> Status {
        entity.get_mut::<Trace>().0.push("slow");
        let countdown = entity.get_mut::<Countdown>();
        if countdown.0 == 0 {
            Status::Success
        } else {
            countdown.0 -= 1;
            Status::Running
        }
    }

    fn run(root: BehaviourNode, ticks: usize) -> (Vec<Status>, Vec<&'static str>) {
        let mut world = EntityManager::new();
        world.register::<Trace>().unwrap();
        world.register::<Countdown>().unwrap();
        let id = world
            .build_entity()
            .with_default::<Trace>()
            .with(Countdown(1))
            .finish();

        let mut tree = BehaviourTree::new(root);
        let mut entity = world.entity_mut(id);
        let statuses = (0..ticks).map(|_| tree.tick(&mut entity)).collect();
        (statuses, world.take::<Trace>(id).0)
    }

    #[test]
    fn sequence_stops_at_first_failure() {
        let root = BehaviourNode::sequence([
            BehaviourNode::action("a", succeed),
            BehaviourNode::action("b", fail),
            BehaviourNode::action("c", succeed),
        ]);
        let (statuses, trace) = run(root, 1);
        assert_eq!(statuses, [Status::Failure]);
        assert_eq!(trace, ["succeed", "fail"]);
    }

    #[test]
    fn selector_stops_at_first_success() {
        let root = BehaviourNode::selector([
            BehaviourNode::action("a", fail),
            BehaviourNode::action("b", succeed),
            BehaviourNode::action("c", fail),
        ]);
        let (statuses, trace) = run(root, 1);
        assert_eq!(statuses, [Status::Success]);
        assert_eq!(trace, ["fail", "succeed"]);
    }

    #[test]
    fn running_child_is_resumed() {
        let root = BehaviourNode::sequence([
            BehaviourNode::action("a", succeed),
            BehaviourNode::action("b", slow),
            BehaviourNode::action("c", succeed),
        ]);
        let (statuses, trace) = run(root, 3);
        assert_eq!(statuses, [Status::Running, Status::Success, Status::Success]);
        // The first child isn't re-run while the second one is in progress
        assert_eq!(
            trace,
            ["succeed", "slow", "slow", "succeed", "succeed", "slow", "succeed"]
        );
    }

    #[test]
    fn loop_repeats_child() {
        let root = BehaviourNode::repeat(3, BehaviourNode::action("a", succeed));
        let (statuses, trace) = run(root, 1);
        assert_eq!(statuses, [Status::Success]);
        assert_eq!(trace.len(), 3);

        let root = BehaviourNode::repeat(3, BehaviourNode::action("a", fail));
        let (statuses, trace) = run(root, 1);
        assert_eq!(statuses, [Status::Failure]);
        assert_eq!(trace.len(), 1);
    }

    #[test]
    fn invert_swaps_outcome() {
        let (statuses, _) = run(BehaviourNode::invert(BehaviourNode::action("a", fail)), 1);
        assert_eq!(statuses, [Status::Success]);

        let (statuses, _) = run(BehaviourNode::invert(BehaviourNode::action("b", succeed)), 1);
        assert_eq!(statuses, [Status::Failure]);

        let (statuses, _) = run(BehaviourNode::invert(BehaviourNode::action("c", slow)), 1);
        assert_eq!(statuses, [Status::Running]);
    }

    #[test]
    fn action_names() {
        assert_eq!(BehaviourNode::action("wander", succeed).action_name(), Some("wander"));
        assert_eq!(BehaviourNode::sequence([]).action_name(), None);
    }
}
