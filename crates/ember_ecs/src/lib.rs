//! The Ember entity store
//!
//! Entities are generational slot indices ([`EntityId`]) into a flat table owned by the
//! [`EntityManager`]. Each registered component type gets a dense [`ComponentAllocator`] addressed
//! by the same slot index, and a bit in every slot's [`ComponentMask`].
//!
//! The whole store is single threaded. Systems run one after another on the thread owning the
//! manager, and structural changes made while iterating go through a [`CommandQueue`].
//!
//! ## Example
//! ```
//! use ember_ecs::{Component, EntityManager};
//!
//! #[derive(Debug, PartialEq)]
//! struct Health(i32);
//! impl Component for Health {}
//!
//! let mut world = EntityManager::new();
//! world.register::<Health>().unwrap();
//!
//! let entity = world.create_entity();
//! world.add(entity, Health(100));
//!
//! for entity in &world {
//!     if entity.has::<Health>() {
//!         assert_eq!(entity.get::<Health>(), &Health(100));
//!     }
//! }
//!
//! world.destroy_entity(entity);
//! assert!(world.is_stale(entity));
//! ```

use std::any::Any;

pub mod components;

#[doc(inline)]
pub use accessor::*;
mod accessor;

#[doc(inline)]
pub use allocator::ComponentAllocator;
mod allocator;

#[doc(inline)]
pub use builder::*;
mod builder;

#[doc(inline)]
pub use commands::*;
mod commands;

#[doc(inline)]
pub use entity::*;
mod entity;

#[doc(inline)]
pub use events::*;
mod events;

#[doc(inline)]
pub use manager::*;
mod manager;

#[doc(inline)]
pub use mask::*;
mod mask;

#[doc(inline)]
pub use registry::*;
mod registry;

/// Marker trait for components.
///
/// Component types have to be registered with [`EntityManager::register`] before use.
pub trait Component: Any {}
