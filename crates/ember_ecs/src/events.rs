//! Synchronous entity lifecycle notifications.
//!
//! Listeners are invoked in-line with [`EntityManager::create_entity`] and
//! [`EntityManager::destroy_entity`], in the order they were subscribed. Nothing is queued.

use crate::{EntityId, EntityManager};
use log::*;
use smallvec::SmallVec;
use std::any::{type_name, Any};

/// Sent right after an entity slot was allocated. The entity has no components yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityCreatedEvent {
    pub entity: EntityId,
}

/// Sent right before an entity is destroyed. Its components are still attached and readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDestroyedEvent {
    pub entity: EntityId,
}

/// Receiver of entity lifecycle events.
///
/// Listeners get read-only access to the manager. Any follow-up mutation (e.g. destroying child
/// entities) has to be recorded by the listener and applied by its owner later.
pub trait EntityListener: Any {
    fn on_entity_created(&mut self, world: &EntityManager, event: &EntityCreatedEvent) {
        let _ = (world, event);
    }

    fn on_entity_destroyed(&mut self, world: &EntityManager, event: &EntityDestroyedEvent) {
        let _ = (world, event);
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Identifies a subscribed listener within its manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u32);

struct Subscription {
    handle: ListenerHandle,
    listener: Box<dyn EntityListener>,
}

/// Ordered list of subscribed listeners.
#[derive(Default)]
pub(crate) struct EventDispatcher {
    next_handle: u32,
    subscriptions: SmallVec<[Subscription; 4]>,
}

impl EventDispatcher {
    pub fn subscribe(&mut self, listener: Box<dyn EntityListener>) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle);
        self.next_handle = self
            .next_handle
            .checked_add(1)
            .expect("listener handle overflow");
        self.subscriptions.push(Subscription { handle, listener });
        handle
    }

    pub fn unsubscribe(&mut self, handle: ListenerHandle) -> Option<Box<dyn EntityListener>> {
        let position = self
            .subscriptions
            .iter()
            .position(|subscription| subscription.handle == handle)?;
        Some(self.subscriptions.remove(position).listener)
    }

    pub fn get(&self, handle: ListenerHandle) -> Option<&dyn EntityListener> {
        self.subscriptions
            .iter()
            .find(|subscription| subscription.handle == handle)
            .map(|subscription| subscription.listener.as_ref())
    }

    pub fn get_mut(&mut self, handle: ListenerHandle) -> Option<&mut dyn EntityListener> {
        self.subscriptions
            .iter_mut()
            .find(|subscription| subscription.handle == handle)
            .map(|subscription| subscription.listener.as_mut())
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn created(&mut self, world: &EntityManager, event: &EntityCreatedEvent) {
        for subscription in &mut self.subscriptions {
            subscription.listener.on_entity_created(world, event);
        }
    }

    pub fn destroyed(&mut self, world: &EntityManager, event: &EntityDestroyedEvent) {
        for subscription in &mut self.subscriptions {
            subscription.listener.on_entity_destroyed(world, event);
        }
    }
}

impl EntityManager {
    /// Subscribes a listener to lifecycle events of this manager.
    pub fn subscribe<L: EntityListener>(&mut self, listener: L) -> ListenerHandle {
        let handle = self.dispatcher.subscribe(Box::new(listener));
        debug!("Subscribed entity listener `{}`", type_name::<L>());
        handle
    }

    /// Removes a listener, returning it. Returns [`None`] for unknown handles.
    pub fn unsubscribe(&mut self, handle: ListenerHandle) -> Option<Box<dyn EntityListener>> {
        self.dispatcher.unsubscribe(handle)
    }

    /// Returns a subscribed listener, if `handle` is known and refers to an `L`.
    pub fn listener<L: EntityListener>(&self, handle: ListenerHandle) -> Option<&L> {
        self.dispatcher.get(handle)?.as_any().downcast_ref()
    }

    /// Like [`EntityManager::listener`], but returns a mutable reference.
    pub fn listener_mut<L: EntityListener>(&mut self, handle: ListenerHandle) -> Option<&mut L> {
        self.dispatcher.get_mut(handle)?.as_any_mut().downcast_mut()
    }

    /// Amount of subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.dispatcher.len()
    }
}

/// Implements the [`EntityListener`] casting boilerplate.
///
/// ## Example
/// ```
/// use ember_ecs::{impl_listener_any, EntityCreatedEvent, EntityListener, EntityManager};
///
/// #[derive(Default)]
/// struct CreationCounter(u32);
///
/// impl EntityListener for CreationCounter {
///     fn on_entity_created(&mut self, _: &EntityManager, _: &EntityCreatedEvent) {
///         self.0 += 1;
///     }
///
///     impl_listener_any!();
/// }
///
/// let mut world = EntityManager::new();
/// let handle = world.subscribe(CreationCounter::default());
/// world.create_entity();
/// world.create_entity();
/// assert_eq!(world.listener::<CreationCounter>(handle).unwrap().0, 2);
/// ```
#[macro_export]
macro_rules! impl_listener_any {
    () => {
        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }
    };
}
