use crate::Component;
use std::any::{type_name, Any};
use std::iter;

/// Dense storage of a single component type, addressed directly by slot index.
///
/// The allocator holds one entry per slot of the owning [`crate::EntityManager`], constructed or
/// not. It doesn't know about component masks, keeping the two consistent is the manager's job.
/// Growing only appends blank entries, so existing entries keep their index.
pub struct ComponentAllocator<T: Component> {
    // Possible optimization idea for the future:
    //  - Store the items as a list of `MaybeUninit<T>`, relying on the manager's masks for
    //    presence instead of the `Option` discriminant
    backend: Vec<Option<T>>,
}

impl<T: Component> ComponentAllocator<T> {
    /// Creates an allocator with `capacity` blank entries.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut allocator = Self {
            backend: Vec::new(),
        };
        allocator.grow(capacity);
        allocator
    }

    /// Amount of addressable entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.backend.len()
    }

    /// Appends blank entries until the allocator can address `capacity` slots. Never shrinks.
    pub fn grow(&mut self, capacity: usize) {
        if capacity > self.backend.len() {
            let missing = capacity - self.backend.len();
            self.backend.extend(iter::repeat_with(|| None).take(missing));
        }
    }

    /// Constructs a component at `index`, returning a reference to it.
    ///
    /// ## Panics
    ///  - if `index` is out of range
    ///  - with debug assertions, if a component is already constructed at `index`
    pub fn construct(&mut self, index: u32, value: T) -> &mut T {
        let entry = &mut self.backend[index as usize];
        debug_assert!(
            entry.is_none(),
            "component `{}` is already constructed at slot {index}",
            type_name::<T>()
        );
        entry.insert(value)
    }

    /// Returns a reference to the component at specified index. Returns [`None`], if the index
    /// is out of range, or no component is constructed there.
    #[inline]
    pub fn get(&self, index: u32) -> Option<&T> {
        self.backend.get(index as usize).and_then(Option::as_ref)
    }

    /// Like [`ComponentAllocator::get`], but returns a mutable reference.
    #[inline]
    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.backend.get_mut(index as usize).and_then(Option::as_mut)
    }

    /// Checks if a component is constructed at `index`.
    #[inline]
    pub fn is_set(&self, index: u32) -> bool {
        self.get(index).is_some()
    }

    /// Moves the component out of `index`, leaving the entry blank.
    pub fn take(&mut self, index: u32) -> Option<T> {
        self.backend.get_mut(index as usize).and_then(Option::take)
    }

    /// Drops the component at `index`.
    ///
    /// ## Panics
    /// With debug assertions, panics if the component is not present.
    pub fn destroy(&mut self, index: u32) {
        let removed = self.take(index);
        debug_assert!(
            removed.is_some(),
            "component `{}` is already clear at slot {index}",
            type_name::<T>()
        );
    }

    /// Iterates over constructed components together with their slot index.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.backend
            .iter()
            .enumerate()
            .filter_map(|(index, value)| Some((index as u32, value.as_ref()?)))
    }

    /// Like [`ComponentAllocator::iter`], but yields mutable references.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.backend
            .iter_mut()
            .enumerate()
            .filter_map(|(index, value)| Some((index as u32, value.as_mut()?)))
    }
}

/// Type-erased view of a [`ComponentAllocator`].
///
/// The manager keeps one of these per registered component type, indexed by
/// [`crate::ComponentIndex`], so it can grow every allocator and destroy arbitrary attached
/// components of a slot without knowing their types.
pub(crate) trait ErasedAllocator: Any {
    fn destroy(&mut self, index: u32);
    fn grow(&mut self, capacity: usize);
    fn capacity(&self) -> usize;
    fn component_name(&self) -> &'static str;

    // This may be unnecessary once trait upcasting is available on the supported toolchain
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn ErasedAllocator {
    pub fn try_cast<T: Component>(&self) -> Option<&ComponentAllocator<T>> {
        self.as_any().downcast_ref()
    }

    pub fn try_cast_mut<T: Component>(&mut self) -> Option<&mut ComponentAllocator<T>> {
        self.as_any_mut().downcast_mut()
    }
}

impl<T: Component> ErasedAllocator for ComponentAllocator<T> {
    fn destroy(&mut self, index: u32) {
        ComponentAllocator::destroy(self, index);
    }

    fn grow(&mut self, capacity: usize) {
        ComponentAllocator::grow(self, capacity);
    }

    fn capacity(&self) -> usize {
        ComponentAllocator::capacity(self)
    }

    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self as &dyn Any
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self as &mut dyn Any
    }
}
