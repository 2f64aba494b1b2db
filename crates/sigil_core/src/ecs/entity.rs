//! # Entities
//!
//! Entity ids, per-entity membership records and the allocator that ties
//! pool mutations to filter re-evaluation and id recycling.
//!
//! ## Id reuse hazard
//!
//! Ids carry no generation counter. An entity is destroyed implicitly the
//! instant its record becomes all-zero; its id returns to the free list and
//! is reissued before any strictly-greater id is minted. A cached [`Entity`]
//! that outlives its destruction will silently observe the next entity
//! issued under the same id. Callers needing safe long-lived handles must
//! layer a generation scheme on top.

use std::num::NonZeroU32;

use super::bits::PoolMask;
use super::filter::FilterRef;
use super::pool::{PoolChange, PoolId};

/// An entity handle: a positive integer id.
///
/// Id 0 is never issued, so `Option<Entity>` costs no extra space. Ids are
/// reused after full release (see the module docs for the hazard).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Entity(NonZeroU32);

impl Entity {
    /// Reconstructs a handle from a raw id, or `None` for id 0.
    ///
    /// Intended for deserialization-style plumbing; the handle is not
    /// validated against any world.
    #[inline]
    #[must_use]
    pub fn from_raw(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    /// The raw positive id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0.get()
    }

    /// Zero-based index into allocator and pool arrays (`id - 1`).
    #[inline]
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.0.get() as usize - 1
    }

    /// Builds the handle for a zero-based index.
    #[inline]
    #[must_use]
    pub(crate) fn from_index(index: u32) -> Self {
        // index + 1 cannot be zero.
        Self(NonZeroU32::MIN.saturating_add(index))
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.get())
    }
}

/// Per-entity membership record: bit `p` set means the entity holds a
/// component in pool `p`.
#[derive(Debug)]
pub(crate) struct EntityRecord {
    mask: PoolMask,
    live: bool,
}

impl EntityRecord {
    /// Fresh all-zero record for a live entity.
    pub(crate) fn new(word_count: usize) -> Self {
        Self {
            mask: PoolMask::new(word_count),
            live: true,
        }
    }

    /// Writes the membership bit for `pool`; idempotent no-op if unchanged.
    pub(crate) fn set_bit(&mut self, pool: PoolId, belong: bool) -> bool {
        self.mask.set(pool.bit(), belong)
    }

    /// `true` iff the entity belongs to no pool.
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Appends one zero word; driven by the allocator when the pool count
    /// crosses a word boundary.
    #[inline]
    pub(crate) fn grow(&mut self) {
        self.mask.grow();
    }

    /// Zeroes the record and marks the entity released.
    pub(crate) fn reset(&mut self) {
        self.mask.clear();
        self.live = false;
    }

    /// Marks the entity live again without touching bits; used when handing
    /// out a recycled, already-zeroed record.
    #[inline]
    pub(crate) fn refresh(&mut self) {
        debug_assert!(self.mask.is_empty(), "recycled record must be zeroed");
        self.live = true;
    }

    #[inline]
    pub(crate) fn is_live(&self) -> bool {
        self.live
    }

    #[inline]
    pub(crate) fn mask(&self) -> &PoolMask {
        &self.mask
    }
}

/// Assigns and recycles entity ids, owns the record array and routes
/// pool-change events into record updates and filter re-evaluation.
#[derive(Debug)]
pub(crate) struct EntityAllocator {
    /// Records indexed by `Entity::index()`; covers every id ever issued.
    records: Vec<EntityRecord>,
    /// Ids returned after full release, reissued LIFO before new ids.
    free: Vec<Entity>,
    /// Highest id ever issued.
    max_id: u32,
    /// Current mask width, shared by every record and filter mask.
    word_count: usize,
}

impl EntityAllocator {
    pub(crate) fn new(entity_capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(entity_capacity),
            free: Vec::new(),
            max_id: 0,
            word_count: 1,
        }
    }

    /// Hands out a ready-to-use id: recycled if available, fresh otherwise.
    ///
    /// A fresh id extends every registered filter's addressable entity
    /// range before it is returned.
    pub(crate) fn create(&mut self, filters: &[FilterRef]) -> Entity {
        if let Some(entity) = self.free.pop() {
            self.records[entity.index()].refresh();
            tracing::trace!(entity = entity.id(), "reissued recycled entity");
            return entity;
        }

        self.records.push(EntityRecord::new(self.word_count));
        self.max_id += 1;
        let entity = Entity::from_index(self.max_id - 1);
        for filter in filters {
            filter.borrow_mut().update_max_entity(self.max_id);
        }
        tracing::trace!(entity = entity.id(), "created entity");
        entity
    }

    /// Routes one pool-change event: updates the record bit, re-checks every
    /// filter in registration order, then recycles the id if the record
    /// became all-zero.
    pub(crate) fn component_changed(&mut self, change: PoolChange, filters: &[FilterRef]) {
        let index = change.entity.index();
        debug_assert!(index < self.records.len(), "change for unknown entity");
        debug_assert!(
            self.records[index].is_live(),
            "change for released entity {}",
            change.entity
        );

        self.records[index].set_bit(change.pool, change.added);

        let record = &self.records[index];
        for filter in filters {
            filter
                .borrow_mut()
                .check_entity(change.entity, record.mask());
        }

        // Implicit destruction: no component bits left means the id goes
        // back on the free list with a cleared record.
        if self.records[index].is_empty() {
            self.records[index].reset();
            self.free.push(change.entity);
            tracing::trace!(entity = change.entity.id(), "recycled entity");
        }
    }

    /// Grows every live record, then every filter mask, by one word when
    /// `pools_amount` pools no longer fit the current width.
    ///
    /// The order is fixed: records must be wide enough before any filter
    /// attempts to read the new bit. Returns `true` if a growth pass ran.
    pub(crate) fn update_pools_amount(
        &mut self,
        pools_amount: usize,
        filters: &[FilterRef],
    ) -> bool {
        if pools_amount <= self.word_count * super::bits::WORD_BITS {
            return false;
        }
        self.word_count += 1;
        for record in &mut self.records {
            record.grow();
        }
        for filter in filters {
            filter.borrow_mut().update_pools_amount(pools_amount);
        }
        tracing::debug!(words = self.word_count, "grew membership masks");
        true
    }

    /// Current mask width in words.
    #[inline]
    pub(crate) fn word_count(&self) -> usize {
        self.word_count
    }

    /// Highest id issued so far.
    #[inline]
    pub(crate) fn max_id(&self) -> u32 {
        self.max_id
    }

    /// Number of live entities.
    #[inline]
    pub(crate) fn live_count(&self) -> usize {
        self.max_id as usize - self.free.len()
    }

    /// Number of ids currently waiting on the free list.
    #[inline]
    pub(crate) fn recycled_count(&self) -> usize {
        self.free.len()
    }

    /// `true` iff `entity` is currently issued.
    pub(crate) fn is_live(&self, entity: Entity) -> bool {
        self.records
            .get(entity.index())
            .is_some_and(EntityRecord::is_live)
    }

    /// Iterates `(entity, record mask)` for every live entity; used to seed
    /// a newly registered filter.
    pub(crate) fn live_records(&self) -> impl Iterator<Item = (Entity, &PoolMask)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.is_live())
            .map(|(index, record)| (Entity::from_index(index as u32), record.mask()))
    }
}
