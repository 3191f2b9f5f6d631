use crate::{Component, EntityId, EntityManager};
use glam::*;
use log::*;

/// Upper bound on parent links followed by [`world_transform`], breaking accidental cycles.
const MAX_HIERARCHY_DEPTH: usize = 64;

/// Represents a 3D entity transform, with a translation and any 3D transformation that can be
/// represented by a 3x3 matrix.
///
/// The optional `parent` is a weak reference: it doesn't keep the parent alive, and it may go
/// stale at any point. Resolve it through [`world_transform`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    pub local: Affine3A,
    pub parent: Option<EntityId>,
}

impl Component for TransformComponent {}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            local: Affine3A::IDENTITY,
            parent: None,
        }
    }
}

impl TransformComponent {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            local: Affine3A::from_translation(translation),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Returns the transform's translation.
    #[inline]
    pub fn position(&self) -> Vec3A {
        self.local.translation
    }

    /// Converts the internal transform into a [`Mat4`].
    #[inline]
    pub fn as_mat4(&self) -> Mat4 {
        self.local.into()
    }

    /// Extracts the rotation out of this transform.
    #[inline]
    pub fn rotation(&self) -> Quat {
        Quat::from_affine3(&self.local)
    }

    /// Adds the provided vector to this transform's translation.
    #[inline]
    pub fn translate(&mut self, v: Vec3A) {
        self.local.translation += v;
    }
}

/// Computes the world-space transform of `entity` by walking its parent chain.
///
/// Parents that are stale or have no transform end the chain, as if the child was a root.
/// Returns [`None`] if `entity` itself is stale or has no transform.
pub fn world_transform(world: &EntityManager, entity: EntityId) -> Option<Affine3A> {
    let mut transform = world.try_get::<TransformComponent>(entity)?;
    let mut result = transform.local;

    for _ in 0..MAX_HIERARCHY_DEPTH {
        let Some(parent) = transform.parent else {
            return Some(result);
        };
        match world.try_get::<TransformComponent>(parent) {
            Some(parent_transform) => {
                result = parent_transform.local * result;
                transform = parent_transform;
            }
            None => return Some(result),
        }
    }

    warn!("Transform hierarchy of {entity} is deeper than {MAX_HIERARCHY_DEPTH}, truncating");
    Some(result)
}
