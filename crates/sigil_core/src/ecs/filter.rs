//! # Registered Filters
//!
//! A filter is a standing query over component membership: an inclusion mask
//! and an exclusion mask matched against every entity's record, with the
//! matching set maintained incrementally as pools change.
//!
//! ## Iteration-safe mutation
//!
//! The defining mechanism of this module is the traversal lock. Code running
//! inside a loop over a filter may add or remove components - and therefore
//! trigger membership changes on the very filter being iterated. The first
//! advance of a traversal locks the filter; while locked, membership changes
//! are queued instead of applied, and the traversal sees exactly the set
//! that existed when it started. Ending the traversal (exhaustion or drop)
//! replays the queue in order and fires a single change notification.
//!
//! This is a re-entrancy guard within one logical traversal, not a thread
//! synchronization primitive; only one traversal of a given filter may be
//! in flight at a time.

use std::any::TypeId;
use std::cell::RefCell;
use std::rc::Rc;

use super::bits::PoolMask;
use super::entity::Entity;
use super::pool::{Component, PoolId};
use super::sparse::SparseSet;
use super::world::World;
use crate::error::EcsError;

/// Shared handle to registered-filter state. The world holds one clone per
/// filter (in registration order, for deterministic re-checks); the
/// user-facing [`Filter`] holds the other.
pub(crate) type FilterRef = Rc<RefCell<FilterCore>>;

/// A membership change deferred while the filter was locked.
#[derive(Clone, Copy, Debug)]
struct PendingOp {
    entity: Entity,
    add: bool,
}

/// Incrementally maintained index of entities matching an include/exclude
/// signature.
pub(crate) struct FilterCore {
    inc_mask: PoolMask,
    exc_mask: PoolMask,
    /// Entities currently matching; exact while unlocked, lagging by
    /// `pending` while locked.
    matched: SparseSet,
    /// Ordered queue of changes deferred during a traversal.
    pending: Vec<PendingOp>,
    locked: bool,
    /// Fired once per batch of applied matched-set changes.
    changed: Option<Box<dyn FnMut()>>,
}

impl FilterCore {
    /// Builds the concrete masks for the given pool id lists, sized to the
    /// world's current word count.
    pub(crate) fn new(
        inc_pools: &[PoolId],
        exc_pools: &[PoolId],
        word_count: usize,
        entity_range: usize,
        dense_capacity: usize,
    ) -> Self {
        let mut inc_mask = PoolMask::new(word_count);
        let mut exc_mask = PoolMask::new(word_count);
        for pool in inc_pools {
            inc_mask.set(pool.bit(), true);
        }
        for pool in exc_pools {
            exc_mask.set(pool.bit(), true);
        }
        Self {
            inc_mask,
            exc_mask,
            matched: SparseSet::new(entity_range, dense_capacity),
            pending: Vec::new(),
            locked: false,
            changed: None,
        }
    }

    /// Evaluates the match predicate over the **full** word count.
    ///
    /// Every word contributes both its inclusion and its exclusion half; the
    /// loop never exits early on a failing word. An early break here would
    /// misreport membership for entities whose signature spans more than one
    /// word (≥ 64 distinct pools).
    fn matches(&self, record: &PoolMask) -> bool {
        debug_assert_eq!(
            self.inc_mask.word_count(),
            record.word_count(),
            "filter mask width diverged from record width"
        );
        let mut matched = true;
        for i in 0..record.word_count() {
            let bits = record.word(i);
            let inc = self.inc_mask.word(i);
            let exc = self.exc_mask.word(i);
            matched &= bits & inc == inc && !bits & exc == exc;
        }
        matched
    }

    /// Re-checks one entity against its updated record.
    ///
    /// Returns `(added, removed)`. Idempotent: a second call with an
    /// unchanged record reports `(false, false)`.
    pub(crate) fn check_entity(&mut self, entity: Entity, record: &PoolMask) -> (bool, bool) {
        let contains = self.matched.contains(entity);
        if self.matches(record) {
            if contains {
                return (false, false);
            }
            self.insert(entity);
            (true, false)
        } else {
            if !contains {
                return (false, false);
            }
            self.remove(entity);
            (false, true)
        }
    }

    /// Applies or defers an insert, depending on the lock.
    fn insert(&mut self, entity: Entity) {
        if self.locked {
            self.pending.push(PendingOp { entity, add: true });
        } else if self.matched.insert(entity) {
            self.notify();
        }
    }

    /// Applies or defers a removal, depending on the lock.
    fn remove(&mut self, entity: Entity) {
        if self.locked {
            self.pending.push(PendingOp { entity, add: false });
        } else if self.matched.remove(entity) {
            self.notify();
        }
    }

    /// Engages the traversal lock.
    pub(crate) fn lock(&mut self) {
        self.locked = true;
    }

    /// Releases the lock, replays the deferred queue in call order through
    /// the unlocked insert/remove path, and fires the change notification
    /// once iff the queue was non-empty.
    pub(crate) fn end_traversal(&mut self) {
        self.locked = false;
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        for op in pending {
            if op.add {
                self.matched.insert(op.entity);
            } else {
                self.matched.remove(op.entity);
            }
        }
        self.notify();
    }

    /// Extends both masks by one zero word when `pools_amount` pools no
    /// longer fit. Called by the allocator after records have grown.
    pub(crate) fn update_pools_amount(&mut self, pools_amount: usize) {
        if self.inc_mask.update_pool_capacity(pools_amount) {
            self.exc_mask.grow();
        }
    }

    /// Extends the matched set's addressable range to cover `max_id`.
    pub(crate) fn update_max_entity(&mut self, max_id: u32) {
        self.matched.grow_range(max_id as usize);
    }

    /// Number of matching entities (stale by the pending queue while
    /// locked).
    #[inline]
    pub(crate) fn count(&self) -> usize {
        self.matched.len()
    }

    /// Matching entity at dense position `slot`.
    #[inline]
    pub(crate) fn dense(&self, slot: usize) -> Option<Entity> {
        self.matched.get(slot)
    }

    /// Installs the result-set-changed callback.
    ///
    /// The callback runs while the filter is internally borrowed and must
    /// not call back into the filter or its world.
    pub(crate) fn set_changed(&mut self, callback: Box<dyn FnMut()>) {
        self.changed = Some(callback);
    }

    fn notify(&mut self) {
        if let Some(callback) = self.changed.as_mut() {
            callback();
        }
    }

    #[cfg(test)]
    fn word_counts(&self) -> (usize, usize) {
        (self.inc_mask.word_count(), self.exc_mask.word_count())
    }
}

/// A standing query, built from typed include/exclude terms.
///
/// Terms are declared with [`inc`](Filter::inc) and [`exc`](Filter::exc),
/// then the filter is bound to a world with [`register`](Filter::register).
/// Count and iteration are available only after registration. Cloning a
/// registered filter shares its matching set.
///
/// ```ignore
/// let mut movers = Filter::new().inc::<Position>().exc::<Frozen>();
/// movers.register(&mut world)?;
/// for entity in movers.iter()? {
///     world.remove_component::<Frozen>(entity);
/// }
/// ```
#[derive(Clone, Default)]
pub struct Filter {
    inc: Vec<Term>,
    exc: Vec<Term>,
    core: Option<FilterRef>,
}

/// One typed term: the component type plus the monomorphized pool binder
/// invoked at registration. Explicit wiring - there is no reflective
/// discovery of filter fields.
#[derive(Clone, Copy)]
struct Term {
    type_id: TypeId,
    type_name: &'static str,
    bind: fn(&mut World) -> PoolId,
}

impl Term {
    fn of<T: Component>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            bind: World::bind_pool::<T>,
        }
    }
}

impl Filter {
    /// An empty, unregistered filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires entities to hold a `T` component. Duplicate terms collapse.
    #[must_use]
    pub fn inc<T: Component>(mut self) -> Self {
        let term = Term::of::<T>();
        if !self.inc.iter().any(|t| t.type_id == term.type_id) {
            self.inc.push(term);
        }
        self
    }

    /// Requires entities to **not** hold a `T` component.
    #[must_use]
    pub fn exc<T: Component>(mut self) -> Self {
        let term = Term::of::<T>();
        if !self.exc.iter().any(|t| t.type_id == term.type_id) {
            self.exc.push(term);
        }
        self
    }

    /// Binds the filter to `world`: binds every referenced pool, computes
    /// the concrete masks and seeds the matching set from all live
    /// entities. Idempotent once registered.
    ///
    /// # Errors
    ///
    /// [`EcsError::ConflictingFilterTerm`] if a component type appears in
    /// both the include and the exclude lists.
    pub fn register(&mut self, world: &mut World) -> Result<(), EcsError> {
        if self.core.is_some() {
            return Ok(());
        }
        for term in &self.exc {
            if self.inc.iter().any(|t| t.type_id == term.type_id) {
                return Err(EcsError::ConflictingFilterTerm {
                    type_name: term.type_name,
                });
            }
        }
        let inc_pools: Vec<PoolId> = self.inc.iter().map(|t| (t.bind)(world)).collect();
        let exc_pools: Vec<PoolId> = self.exc.iter().map(|t| (t.bind)(world)).collect();
        self.core = Some(world.register_filter(&inc_pools, &exc_pools));
        Ok(())
    }

    fn core(&self) -> Result<&FilterRef, EcsError> {
        self.core.as_ref().ok_or(EcsError::FilterNotRegistered)
    }

    /// Number of entities currently matching.
    ///
    /// # Errors
    ///
    /// [`EcsError::FilterNotRegistered`] before [`register`](Self::register).
    pub fn count(&self) -> Result<usize, EcsError> {
        Ok(self.core()?.borrow().count())
    }

    /// Starts a traversal yielding [`Entity`] handles.
    ///
    /// The element count and identity are fixed at the first advance;
    /// membership changes triggered from inside the loop are applied, in
    /// order, when the traversal ends (iterator exhausted or dropped). Only
    /// one traversal of a filter may be in flight at a time.
    ///
    /// # Errors
    ///
    /// [`EcsError::FilterNotRegistered`] before [`register`](Self::register).
    pub fn iter(&self) -> Result<FilterEntities, EcsError> {
        Ok(FilterEntities {
            core: Rc::clone(self.core()?),
            cursor: 0,
            finished: false,
        })
    }

    /// Starts a traversal yielding raw entity ids.
    ///
    /// Same protocol as [`iter`](Self::iter); a separate, statically typed
    /// entry point rather than a runtime-switched element type.
    ///
    /// # Errors
    ///
    /// [`EcsError::FilterNotRegistered`] before [`register`](Self::register).
    pub fn iter_ids(&self) -> Result<FilterIds, EcsError> {
        Ok(FilterIds {
            core: Rc::clone(self.core()?),
            cursor: 0,
            finished: false,
        })
    }

    /// Installs a callback fired once per batch of matched-set changes.
    ///
    /// The callback must not call back into the filter or its world.
    ///
    /// # Errors
    ///
    /// [`EcsError::FilterNotRegistered`] before [`register`](Self::register).
    pub fn on_changed(&self, callback: impl FnMut() + 'static) -> Result<(), EcsError> {
        self.core()?.borrow_mut().set_changed(Box::new(callback));
        Ok(())
    }
}

/// Traversal over a filter's matching entities, yielding handles.
///
/// The traversal ends - releasing the lock and replaying deferred changes -
/// either when the iterator is exhausted or when it is dropped early,
/// whichever comes first.
pub struct FilterEntities {
    core: FilterRef,
    cursor: usize,
    /// Set once the traversal has ended, so `Drop` cannot end it twice
    /// (and cannot cut short a later traversal of the shared core).
    finished: bool,
}

impl Iterator for FilterEntities {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        if self.finished {
            return None;
        }
        let mut core = self.core.borrow_mut();
        if self.cursor == 0 {
            core.lock();
        }
        match core.dense(self.cursor) {
            Some(entity) => {
                self.cursor += 1;
                Some(entity)
            }
            None => {
                self.finished = true;
                core.end_traversal();
                None
            }
        }
    }
}

impl Drop for FilterEntities {
    fn drop(&mut self) {
        if !self.finished {
            self.core.borrow_mut().end_traversal();
        }
    }
}

/// Traversal over a filter's matching entities, yielding raw ids.
///
/// Same end-of-traversal semantics as [`FilterEntities`]: exhaustion or an
/// early drop releases the lock and replays deferred changes.
pub struct FilterIds {
    core: FilterRef,
    cursor: usize,
    finished: bool,
}

impl Iterator for FilterIds {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.finished {
            return None;
        }
        let mut core = self.core.borrow_mut();
        if self.cursor == 0 {
            core.lock();
        }
        match core.dense(self.cursor) {
            Some(entity) => {
                self.cursor += 1;
                Some(entity.id())
            }
            None => {
                self.finished = true;
                core.end_traversal();
                None
            }
        }
    }
}

impl Drop for FilterIds {
    fn drop(&mut self) {
        if !self.finished {
            self.core.borrow_mut().end_traversal();
        }
    }
}
