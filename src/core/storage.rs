use crate::bodies::RigidBody;
use crate::constraints::Joint;
use crate::core::{BodyHandle, JointHandle, LogicHandle, PhysicsStructure, StructureHandle};
use crate::error::PhysicsError;
use crate::Result;
use std::marker::PhantomData;
use thunderdome as td;

/// A typed handle into an arena-backed [`Storage`]
pub trait StorageHandle: Copy + std::fmt::Debug {
    /// Human-readable handle kind, used in error messages
    const KIND: &'static str;

    /// Wraps an arena index
    fn from_index(index: td::Index) -> Self;

    /// Unwraps the arena index
    fn to_index(self) -> td::Index;
}

/// Generic storage trait for physics objects
pub trait Storage<T, H> {
    /// Creates a new empty storage
    fn new() -> Self;

    /// Adds an item to the storage and returns its handle
    fn add(&mut self, item: T) -> H;

    /// Gets a reference to an item by its handle
    fn get(&self, handle: H) -> Option<&T>;

    /// Gets a mutable reference to an item by its handle
    fn get_mut(&mut self, handle: H) -> Option<&mut T>;

    /// Removes an item from the storage
    fn remove(&mut self, handle: H) -> Option<T>;

    /// Returns whether the handle still refers to an item
    fn contains(&self, handle: H) -> bool;

    /// Returns the number of items in the storage
    fn len(&self) -> usize;

    /// Returns whether the storage is empty
    fn is_empty(&self) -> bool;

    /// Clears all items from the storage
    fn clear(&mut self);

    /// Returns all handles, in slot order
    fn handles(&self) -> Vec<H>;

    /// Returns an iterator over all items
    fn iter<'a>(&'a self) -> impl Iterator<Item = (H, &'a T)> + 'a where T: 'a;

    /// Returns a mutable iterator over all items
    fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = (H, &'a mut T)> + 'a where T: 'a;
}

/// Generational arena storage keyed by a typed handle.
///
/// A removed item's handle never resolves again, even after its slot is reused.
#[derive(Debug)]
pub struct ArenaStorage<T, H> {
    items: td::Arena<T>,
    _handle: PhantomData<H>,
}

/// Storage for physics bodies
pub type BodyStorage<T> = ArenaStorage<T, BodyHandle>;

/// Storage for joints
pub type JointStorage<T> = ArenaStorage<T, JointHandle>;

/// Storage for structures
pub type StructureStorage<T> = ArenaStorage<T, StructureHandle>;

/// Storage for physics logics
pub type LogicStorage<T> = ArenaStorage<T, LogicHandle>;

impl<T, H: StorageHandle> Default for ArenaStorage<T, H> {
    fn default() -> Self {
        <Self as Storage<T, H>>::new()
    }
}

impl<T, H: StorageHandle> Storage<T, H> for ArenaStorage<T, H> {
    fn new() -> Self {
        Self {
            items: td::Arena::new(),
            _handle: PhantomData,
        }
    }

    fn add(&mut self, item: T) -> H {
        H::from_index(self.items.insert(item))
    }

    fn get(&self, handle: H) -> Option<&T> {
        self.items.get(handle.to_index())
    }

    fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.items.get_mut(handle.to_index())
    }

    fn remove(&mut self, handle: H) -> Option<T> {
        self.items.remove(handle.to_index())
    }

    fn contains(&self, handle: H) -> bool {
        self.items.contains(handle.to_index())
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    fn handles(&self) -> Vec<H> {
        self.items.iter().map(|(index, _)| H::from_index(index)).collect()
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = (H, &'a T)> + 'a where T: 'a {
        self.items.iter().map(|(index, item)| (H::from_index(index), item))
    }

    fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = (H, &'a mut T)> + 'a where T: 'a {
        self.items.iter_mut().map(|(index, item)| (H::from_index(index), item))
    }
}

impl<T, H: StorageHandle> ArenaStorage<T, H> {
    /// Gets an item by its handle, returning an error if not found
    pub fn get_checked(&self, handle: H) -> Result<&T> {
        self.get(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("{} {:?} not found", H::KIND, handle)))
    }

    /// Gets a mutable reference to an item by its handle, returning an error if not found
    pub fn get_checked_mut(&mut self, handle: H) -> Result<&mut T> {
        self.get_mut(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("{} {:?} not found", H::KIND, handle)))
    }

    /// Borrows two distinct items mutably at once.
    ///
    /// Returns `None` if either handle is stale or both are the same.
    pub fn get_pair_mut(&mut self, a: H, b: H) -> Option<(&mut T, &mut T)> {
        let (a, b) = (a.to_index(), b.to_index());
        if a == b {
            return None;
        }
        match self.items.get2_mut(a, b) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }

    /// Removes every item matching `remove`, returning the removed items
    /// with their handles
    pub fn drain_where(&mut self, mut remove: impl FnMut(&T) -> bool) -> Vec<(H, T)> {
        let doomed: Vec<td::Index> = self
            .items
            .iter()
            .filter(|(_, item)| remove(item))
            .map(|(index, _)| index)
            .collect();

        doomed
            .into_iter()
            .filter_map(|index| self.items.remove(index).map(|item| (H::from_index(index), item)))
            .collect()
    }
}

impl BodyStorage<RigidBody> {
    /// Gets a body by its handle, returning an error if not found
    pub fn get_body(&self, handle: BodyHandle) -> Result<&RigidBody> {
        self.get_checked(handle)
    }

    /// Gets a mutable reference to a body by its handle, returning an error if not found
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody> {
        self.get_checked_mut(handle)
    }
}

impl JointStorage<Joint> {
    /// Gets a joint by its handle, returning an error if not found
    pub fn get_joint(&self, handle: JointHandle) -> Result<&Joint> {
        self.get_checked(handle)
    }

    /// Gets a mutable reference to a joint by its handle, returning an error if not found
    pub fn get_joint_mut(&mut self, handle: JointHandle) -> Result<&mut Joint> {
        self.get_checked_mut(handle)
    }
}

impl StructureStorage<PhysicsStructure> {
    /// Gets a structure by its handle, returning an error if not found
    pub fn get_structure(&self, handle: StructureHandle) -> Result<&PhysicsStructure> {
        self.get_checked(handle)
    }

    /// Gets a mutable reference to a structure by its handle, returning an error if not found
    pub fn get_structure_mut(&mut self, handle: StructureHandle) -> Result<&mut PhysicsStructure> {
        self.get_checked_mut(handle)
    }
}
