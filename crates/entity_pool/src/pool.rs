//! Bounded identity allocation and the entity arena built on it.
//!
//! [`IdentityPool`] hands out the lowest free ID in `[0, capacity)` and never
//! wraps: a full pool returns [`PoolError::Exhausted`]. Every release bumps the
//! slot's generation, so handles held past their entity's destruction are
//! detectably stale.
//!
//! [`EntityPool`] stores one record per live handle.

use std::collections::BTreeSet;

use tracing::warn;

use crate::error::PoolError;
use crate::id::Handle;
use crate::limits::MAX_POOL_CAPACITY;

/// Allocates and recycles small integer IDs for a bounded population.
#[derive(Debug, Clone)]
pub struct IdentityPool {
    /// Current generation of each slot.
    generations: Vec<u32>,
    /// Whether each slot is currently allocated.
    occupied: Vec<bool>,
    /// Free slot indices, lowest first.
    free: BTreeSet<u16>,
}

impl IdentityPool {
    /// Create a pool with `capacity` slots, clamped to [`MAX_POOL_CAPACITY`].
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_POOL_CAPACITY);
        Self {
            generations: vec![0; capacity],
            occupied: vec![false; capacity],
            free: (0..capacity as u16).collect(),
        }
    }

    /// Allocate the lowest free ID.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Exhausted`] when every slot is in use.
    pub fn allocate(&mut self) -> Result<Handle, PoolError> {
        let Some(index) = self.free.pop_first() else {
            warn!(capacity = self.capacity(), "identity pool exhausted");
            return Err(PoolError::Exhausted {
                capacity: self.capacity(),
            });
        };
        let slot = index as usize;
        self.occupied[slot] = true;
        Ok(Handle::new(index, self.generations[slot]))
    }

    /// Release a live handle. The slot's generation advances so `handle`
    /// (and every copy of it) stops resolving.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotFound`] if the handle is not live.
    pub fn release(&mut self, handle: Handle) -> Result<(), PoolError> {
        if !self.contains(handle) {
            return Err(PoolError::NotFound(handle));
        }
        let slot = handle.index as usize;
        self.occupied[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.insert(handle.index);
        Ok(())
    }

    /// Returns `true` if `handle` names a live slot of the current generation.
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        let slot = handle.index as usize;
        slot < self.capacity()
            && self.occupied[slot]
            && self.generations[slot] == handle.generation
    }

    /// Resolve a raw pool ID (as received from a script or the wire) to the
    /// handle currently living in that slot.
    #[must_use]
    pub fn handle_at(&self, id: usize) -> Option<Handle> {
        if id < self.capacity() && self.occupied[id] {
            Some(Handle::new(id as u16, self.generations[id]))
        } else {
            None
        }
    }

    /// Returns the live handles in ascending ID order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> {
        self.occupied
            .iter()
            .enumerate()
            .filter(|(_, occupied)| **occupied)
            .map(|(i, _)| Handle::new(i as u16, self.generations[i]))
    }

    /// Fixed number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.occupied.len()
    }

    /// Number of live IDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.capacity() - self.free.len()
    }

    /// Returns `true` if no ID is allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the next [`allocate`](Self::allocate) would fail.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    fn generation(&self, slot: usize) -> u32 {
        self.generations[slot]
    }
}

/// A fixed-capacity arena of entity records keyed by generational handles.
#[derive(Debug, Clone)]
pub struct EntityPool<T> {
    ids: IdentityPool,
    slots: Vec<Option<T>>,
}

impl<T> EntityPool<T> {
    /// Create an empty arena with `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let ids = IdentityPool::new(capacity);
        let slots = std::iter::repeat_with(|| None).take(ids.capacity()).collect();
        Self { ids, slots }
    }

    /// Allocate a handle and store the record built from it.
    ///
    /// The builder receives the handle so records can carry their own ID.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Exhausted`] when the arena is full; existing
    /// records are left untouched.
    pub fn insert_with(&mut self, build: impl FnOnce(Handle) -> T) -> Result<Handle, PoolError> {
        let handle = self.ids.allocate()?;
        self.slots[handle.index as usize] = Some(build(handle));
        Ok(handle)
    }

    /// Remove and return the record for `handle`, releasing its ID.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotFound`] if the handle is not live.
    pub fn remove(&mut self, handle: Handle) -> Result<T, PoolError> {
        self.ids.release(handle)?;
        self.slots[handle.index as usize]
            .take()
            .ok_or(PoolError::NotFound(handle))
    }

    /// Returns the record for a live handle.
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        if self.ids.contains(handle) {
            self.slots[handle.index as usize].as_ref()
        } else {
            None
        }
    }

    /// Returns the record for a live handle, mutably.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        if self.ids.contains(handle) {
            self.slots[handle.index as usize].as_mut()
        } else {
            None
        }
    }

    /// Returns `true` if `handle` is live.
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.ids.contains(handle)
    }

    /// Resolve a raw pool ID to its live handle.
    #[must_use]
    pub fn handle_at(&self, id: usize) -> Option<Handle> {
        self.ids.handle_at(id)
    }

    /// Snapshot of the live handles, ascending.
    #[must_use]
    pub fn handles(&self) -> Vec<Handle> {
        self.ids.handles().collect()
    }

    /// Iterate over live records in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        let ids = &self.ids;
        self.slots.iter().enumerate().filter_map(move |(i, slot)| {
            slot.as_ref()
                .map(|record| (Handle::new(i as u16, ids.generation(i)), record))
        })
    }

    /// Iterate mutably over live records in ascending ID order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        let ids = &self.ids;
        self.slots.iter_mut().enumerate().filter_map(move |(i, slot)| {
            slot.as_mut()
                .map(|record| (Handle::new(i as u16, ids.generation(i)), record))
        })
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if the arena holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Fixed number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ids.capacity()
    }
}
