//! # Component Pools
//!
//! Dense, recyclable storage for one component type, keyed by entity id.
//!
//! ## Layout
//!
//! ```text
//! slots:     [ {owner, value}, {owner, value}, ... ]  <- dense, append + recycle
//! free:      [ 3, 0 ]                                 <- reusable slot indices
//! by_entity: [ Some(1), None, Some(2), ... ]          <- entity index -> slot
//! ```
//!
//! Every mutation emits a change event on the owning world's channel; the
//! world drains that channel synchronously after each mutating entry point,
//! so records and filters are reconciled before the call returns.

use std::any::Any;

use crossbeam_channel::Sender;

use super::entity::Entity;
use crate::error::EcsError;

/// Marker for types storable in a component pool.
///
/// Pools value-initialize on add and re-initialize on remove, hence the
/// [`Default`] bound. Blanket-implemented; any plain data type qualifies.
pub trait Component: Default + 'static {}

impl<T: Default + 'static> Component for T {}

/// A pool's process-unique small integer id; doubles as the bit position in
/// entity records and filter masks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PoolId(u32);

impl PoolId {
    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Bit position in membership masks.
    #[inline]
    #[must_use]
    pub(crate) const fn bit(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PoolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One pool mutation: `added` is `true` for add, `false` for remove.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PoolChange {
    pub(crate) pool: PoolId,
    pub(crate) entity: Entity,
    pub(crate) added: bool,
}

/// Type-erased pool handle held by the world. A pool's id equals its
/// position in the world's pool list.
pub(crate) trait PoolStore {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// One storage slot. `owner` doubles as the exists flag.
#[derive(Debug)]
struct Slot<T> {
    owner: Option<Entity>,
    value: T,
}

/// Dense, recyclable storage for components of type `T`.
///
/// Owned by a [`World`](super::world::World); mutation goes through the
/// world's typed entry points so that change events are routed into record
/// updates and filter re-evaluation. Read access is available directly via
/// [`World::pool`](super::world::World::pool).
#[derive(Debug)]
pub struct ComponentPool<T: Component> {
    id: PoolId,
    slots: Vec<Slot<T>>,
    /// Recycled slot indices, claimed LIFO before appending.
    free: Vec<u32>,
    /// Entity index -> slot index.
    by_entity: Vec<Option<u32>>,
    /// Live component count.
    len: usize,
    changes: Sender<PoolChange>,
}

impl<T: Component> ComponentPool<T> {
    pub(crate) fn new(id: PoolId, changes: Sender<PoolChange>, capacity: usize) -> Self {
        Self {
            id,
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            by_entity: Vec::with_capacity(capacity),
            len: 0,
            changes,
        }
    }

    /// The pool's process-unique id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// O(1) membership test via the indirection array.
    #[must_use]
    pub fn has(&self, entity: Entity) -> bool {
        self.slot_of(entity).is_some()
    }

    /// Resolves `entity` to its slot index, validating the owner invariant:
    /// the indirection entry must point at a slot owned by this entity.
    fn slot_of(&self, entity: Entity) -> Option<u32> {
        let slot = (*self.by_entity.get(entity.index())?)?;
        (self.slots[slot as usize].owner == Some(entity)).then_some(slot)
    }

    /// Number of live components in the pool.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` iff no entity holds a component in this pool.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Claims a slot for `entity` with a default-initialized value.
    ///
    /// Prefers a recycled slot, appends otherwise. Emits an `added` change
    /// event.
    ///
    /// # Errors
    ///
    /// [`EcsError::DuplicateComponent`] if the entity already holds a
    /// component here.
    pub(crate) fn add(&mut self, entity: Entity) -> Result<(), EcsError> {
        if self.has(entity) {
            return Err(EcsError::DuplicateComponent {
                entity,
                pool: self.id,
            });
        }
        if self.by_entity.len() <= entity.index() {
            self.by_entity.resize(entity.index() + 1, None);
        }

        let slot = if let Some(slot) = self.free.pop() {
            let recycled = &mut self.slots[slot as usize];
            recycled.owner = Some(entity);
            recycled.value = T::default();
            slot
        } else {
            self.slots.push(Slot {
                owner: Some(entity),
                value: T::default(),
            });
            (self.slots.len() - 1) as u32
        };

        self.by_entity[entity.index()] = Some(slot);
        self.len += 1;
        self.changes
            .send(PoolChange {
                pool: self.id,
                entity,
                added: true,
            })
            .ok();
        Ok(())
    }

    /// Shared reference to the stored value.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if absent.
    pub fn get(&self, entity: Entity) -> Result<&T, EcsError> {
        match self.slot_of(entity) {
            Some(slot) => Ok(&self.slots[slot as usize].value),
            None => Err(EcsError::MissingComponent {
                entity,
                pool: self.id,
            }),
        }
    }

    /// Mutable reference to the stored value.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if absent.
    pub(crate) fn get_mut(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        match self.slot_of(entity) {
            Some(slot) => Ok(&mut self.slots[slot as usize].value),
            None => Err(EcsError::MissingComponent {
                entity,
                pool: self.id,
            }),
        }
    }

    /// Releases `entity`'s slot back to the free list.
    ///
    /// Silent no-op (returns `false`) if absent - removing an absent
    /// component is not an error. Emits a `removed` change event otherwise.
    pub(crate) fn remove(&mut self, entity: Entity) -> bool {
        let Some(slot) = self.slot_of(entity) else {
            return false;
        };
        let released = &mut self.slots[slot as usize];
        released.owner = None;
        released.value = T::default();
        self.free.push(slot);
        self.by_entity[entity.index()] = None;
        self.len -= 1;
        self.changes
            .send(PoolChange {
                pool: self.id,
                entity,
                added: false,
            })
            .ok();
        true
    }
}

impl<T: Component> PoolStore for ComponentPool<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
