use crate::Component;
use ahash::AHashMap;
use log::*;
use std::any::{type_name, TypeId};
use std::fmt;

/// Upper bound of distinct component types a single [`crate::EntityManager`] can register.
pub const MAX_COMPONENTS: usize = 64;

/// Small integer assigned to a component type on registration. It selects the type's allocator
/// and its bit in every [`crate::ComponentMask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentIndex(u8);

impl ComponentIndex {
    #[inline]
    pub(crate) const fn from_raw(index: u8) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) const fn bit(self) -> u64 {
        1 << self.0
    }
}

impl fmt::Display for ComponentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("cannot register `{name}`: the limit of {max} component types is reached")]
    TooManyComponents { name: &'static str, max: usize },
}

/// Registration record of a single component type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    pub index: ComponentIndex,
    pub name: &'static str,
    pub type_id: TypeId,
}

/// Maps component types to their [`ComponentIndex`].
///
/// Indices are handed out in registration order, starting at 0. Every manager owns its own
/// registry, so the same type may get different indices in different managers.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_type: AHashMap<TypeId, ComponentIndex>,
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T`, returning its index. Registering an already known type returns the index it
    /// was assigned the first time.
    pub fn register<T: Component>(&mut self) -> Result<ComponentIndex, RegistryError> {
        if let Some(&index) = self.by_type.get(&TypeId::of::<T>()) {
            return Ok(index);
        }

        if self.infos.len() >= MAX_COMPONENTS {
            return Err(RegistryError::TooManyComponents {
                name: type_name::<T>(),
                max: MAX_COMPONENTS,
            });
        }

        let index = ComponentIndex::from_raw(self.infos.len() as u8);
        self.by_type.insert(TypeId::of::<T>(), index);
        self.infos.push(ComponentInfo {
            index,
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
        });

        trace!("Registered component `{}` as {index}", type_name::<T>());
        Ok(index)
    }

    #[inline]
    pub fn index_of<T: Component>(&self) -> Option<ComponentIndex> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Like [`ComponentRegistry::index_of`], but treats an unregistered type as misuse.
    ///
    /// ## Panics
    /// Panics if `T` was never registered.
    #[inline]
    pub fn expect_index<T: Component>(&self) -> ComponentIndex {
        match self.index_of::<T>() {
            Some(index) => index,
            None => panic!("component `{}` was not registered", type_name::<T>()),
        }
    }

    pub fn info(&self, index: ComponentIndex) -> Option<&ComponentInfo> {
        self.infos.get(index.get())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.infos.iter()
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}
