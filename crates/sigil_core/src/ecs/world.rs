//! # World
//!
//! The world owns every piece of runtime state and is the only mutation
//! entry point:
//!
//! ```text
//!   World
//!     ├── pools       type-erased component pools, bound on first use
//!     ├── allocator   entity records + id free list
//!     ├── filters     registered filter cores, in registration order
//!     └── changes     pool-change queue, drained after every mutation
//! ```
//!
//! Pools report adds and removals onto the change queue; the world drains
//! it synchronously before any mutating call returns, so records and filter
//! matching sets are never observably stale.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crossbeam_channel::{Receiver, Sender};

use super::entity::{Entity, EntityAllocator};
use super::filter::{FilterCore, FilterRef};
use super::pool::{Component, ComponentPool, PoolChange, PoolId, PoolStore};
use crate::config::WorldConfig;
use crate::error::EcsError;

/// Container for entities, component pools and registered filters.
pub struct World {
    pools: Vec<Box<dyn PoolStore>>,
    pool_ids: HashMap<TypeId, PoolId>,
    filters: Vec<FilterRef>,
    allocator: EntityAllocator,
    changes_tx: Sender<PoolChange>,
    changes_rx: Receiver<PoolChange>,
    config: WorldConfig,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// A world with default capacities.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// A world whose initial capacities come from `config`.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        let (changes_tx, changes_rx) = crossbeam_channel::unbounded();
        Self {
            pools: Vec::new(),
            pool_ids: HashMap::new(),
            filters: Vec::new(),
            allocator: EntityAllocator::new(config.entity_capacity),
            changes_tx,
            changes_rx,
            config,
        }
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Issues an entity id, recycling a released one when available.
    ///
    /// The returned entity holds no components yet; it becomes eligible for
    /// implicit destruction only after it has gained and then lost at least
    /// one component.
    pub fn create_entity(&mut self) -> Entity {
        self.allocator.create(&self.filters)
    }

    /// `true` iff `entity` is currently issued and not recycled.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_live(entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.allocator.live_count()
    }

    /// Number of released ids waiting to be reissued.
    #[must_use]
    pub fn recycled_count(&self) -> usize {
        self.allocator.recycled_count()
    }

    /// Number of bound component pools.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    // ========================================================================
    // Pools and components
    // ========================================================================

    /// Binds the pool for `T`, creating it on first use.
    ///
    /// Pool ids are issued in first-bind order. When a new pool no longer
    /// fits the current mask width, every record and filter mask grows by
    /// one word before this returns.
    pub fn bind_pool<T: Component>(&mut self) -> PoolId {
        let type_id = TypeId::of::<T>();
        if let Some(id) = self.pool_ids.get(&type_id) {
            return *id;
        }
        let id = PoolId::new(self.pools.len() as u32);
        self.pools.push(Box::new(ComponentPool::<T>::new(
            id,
            self.changes_tx.clone(),
            self.config.component_capacity,
        )));
        self.pool_ids.insert(type_id, id);
        self.allocator
            .update_pools_amount(self.pools.len(), &self.filters);
        tracing::debug!(
            pool = id.id(),
            component = std::any::type_name::<T>(),
            "bound component pool"
        );
        id
    }

    /// `true` iff a pool for `T` has been bound.
    #[must_use]
    pub fn has_pool<T: Component>(&self) -> bool {
        self.pool_ids.contains_key(&TypeId::of::<T>())
    }

    /// Borrows the pool for `T`.
    ///
    /// # Errors
    ///
    /// [`EcsError::PoolNotBound`] if no pool for `T` exists yet.
    pub fn pool<T: Component>(&self) -> Result<&ComponentPool<T>, EcsError> {
        let not_bound = EcsError::PoolNotBound {
            type_name: std::any::type_name::<T>(),
        };
        let id = self.pool_ids.get(&TypeId::of::<T>()).ok_or(not_bound)?;
        self.pools[id.id() as usize]
            .as_any()
            .downcast_ref::<ComponentPool<T>>()
            .ok_or(not_bound)
    }

    fn pool_mut<T: Component>(&mut self) -> Result<&mut ComponentPool<T>, EcsError> {
        let not_bound = EcsError::PoolNotBound {
            type_name: std::any::type_name::<T>(),
        };
        let id = *self.pool_ids.get(&TypeId::of::<T>()).ok_or(not_bound)?;
        self.pools[id.id() as usize]
            .as_any_mut()
            .downcast_mut::<ComponentPool<T>>()
            .ok_or(not_bound)
    }

    /// Adds a default-initialized `T` to `entity`, binding the pool if
    /// needed, and returns a mutable borrow of the fresh value.
    ///
    /// Records and filter matching sets reflect the addition before this
    /// returns.
    ///
    /// # Errors
    ///
    /// [`EcsError::DuplicateComponent`] if the entity already holds a `T`.
    pub fn add_component<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.bind_pool::<T>();
        self.pool_mut::<T>()?.add(entity)?;
        self.flush_changes();
        self.pool_mut::<T>()?.get_mut(entity)
    }

    /// Shared borrow of `entity`'s `T` component.
    ///
    /// # Errors
    ///
    /// [`EcsError::PoolNotBound`] if no pool for `T` exists;
    /// [`EcsError::MissingComponent`] if the entity holds no `T`.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.pool::<T>()?.get(entity)
    }

    /// Mutable borrow of `entity`'s `T` component.
    ///
    /// # Errors
    ///
    /// [`EcsError::PoolNotBound`] if no pool for `T` exists;
    /// [`EcsError::MissingComponent`] if the entity holds no `T`.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.pool_mut::<T>()?.get_mut(entity)
    }

    /// Mutable borrow of `entity`'s `T`, adding a default value first if the
    /// entity holds none.
    ///
    /// # Errors
    ///
    /// Propagates pool errors; never fails for a live entity in practice.
    pub fn get_or_add_component<T: Component>(
        &mut self,
        entity: Entity,
    ) -> Result<&mut T, EcsError> {
        self.bind_pool::<T>();
        if !self.pool::<T>()?.has(entity) {
            self.pool_mut::<T>()?.add(entity)?;
            self.flush_changes();
        }
        self.pool_mut::<T>()?.get_mut(entity)
    }

    /// `true` iff `entity` currently holds a `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.pool::<T>().is_ok_and(|pool| pool.has(entity))
    }

    /// Removes `entity`'s `T` component. Returns `false` without effect
    /// when the entity holds none (or no pool for `T` exists).
    ///
    /// Removing the last component releases the entity's id for reuse.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> bool {
        let Ok(pool) = self.pool_mut::<T>() else {
            return false;
        };
        let removed = pool.remove(entity);
        if removed {
            self.flush_changes();
        }
        removed
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Creates a filter core for the given pool signature and seeds it from
    /// every live entity, in id order. Dead records do not participate.
    pub(crate) fn register_filter(
        &mut self,
        inc_pools: &[PoolId],
        exc_pools: &[PoolId],
    ) -> FilterRef {
        let entity_range =
            (self.allocator.max_id() as usize).max(self.config.filter_entity_range);
        let mut core = FilterCore::new(
            inc_pools,
            exc_pools,
            self.allocator.word_count(),
            entity_range,
            self.config.filter_dense_capacity,
        );
        for (entity, record) in self.allocator.live_records() {
            core.check_entity(entity, record);
        }
        let core = Rc::new(RefCell::new(core));
        self.filters.push(Rc::clone(&core));
        tracing::debug!(
            inc = inc_pools.len(),
            exc = exc_pools.len(),
            total = self.filters.len(),
            "registered filter"
        );
        core
    }

    /// Drains queued pool changes: each one updates the entity's record and
    /// re-checks every filter in registration order.
    fn flush_changes(&mut self) {
        while let Ok(change) = self.changes_rx.try_recv() {
            self.allocator.component_changed(change, &self.filters);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::filter::Filter;

    #[derive(Default)]
    struct Health(i32);

    #[derive(Default)]
    struct Armor;

    #[derive(Default)]
    struct Poisoned;

    #[derive(Default)]
    struct Marker<const N: usize>;

    #[test]
    fn pool_ids_follow_bind_order() {
        let mut world = World::new();
        assert_eq!(world.bind_pool::<Health>().id(), 0);
        assert_eq!(world.bind_pool::<Armor>().id(), 1);
        // Re-binding is idempotent.
        assert_eq!(world.bind_pool::<Health>().id(), 0);
        assert_eq!(world.pool_count(), 2);
    }

    #[test]
    fn component_lifecycle_and_implicit_destruction() {
        let mut world = World::new();
        let entity = world.create_entity();
        assert!(world.is_alive(entity));

        world.add_component::<Health>(entity).unwrap().0 = 80;
        world.add_component::<Armor>(entity).unwrap();
        assert_eq!(world.get_component::<Health>(entity).unwrap().0, 80);
        assert!(world.has_component::<Armor>(entity));

        assert!(world.remove_component::<Health>(entity));
        assert!(world.is_alive(entity));

        // Losing the last component releases the id.
        assert!(world.remove_component::<Armor>(entity));
        assert!(!world.is_alive(entity));
        assert_eq!(world.entity_count(), 0);

        // And the next creation reissues it with a clean record.
        let reborn = world.create_entity();
        assert_eq!(reborn, entity);
        assert!(!world.has_component::<Health>(reborn));
    }

    #[test]
    fn filter_tracks_adds_and_removes() {
        let mut world = World::new();
        let mut filter = Filter::new().inc::<Health>().exc::<Poisoned>();
        filter.register(&mut world).unwrap();

        let entity = world.create_entity();
        world.add_component::<Health>(entity).unwrap();
        assert_eq!(filter.count().unwrap(), 1);

        world.add_component::<Poisoned>(entity).unwrap();
        assert_eq!(filter.count().unwrap(), 0);

        world.remove_component::<Poisoned>(entity);
        assert_eq!(filter.count().unwrap(), 1);
        assert_eq!(filter.iter().unwrap().collect::<Vec<_>>(), vec![entity]);
    }

    #[test]
    fn late_registered_filter_seeds_from_live_entities() {
        let mut world = World::new();
        let healthy = world.create_entity();
        world.add_component::<Health>(healthy).unwrap();
        let poisoned = world.create_entity();
        world.add_component::<Health>(poisoned).unwrap();
        world.add_component::<Poisoned>(poisoned).unwrap();

        // A released entity must not leak into the seed.
        let gone = world.create_entity();
        world.add_component::<Health>(gone).unwrap();
        world.remove_component::<Health>(gone);

        let mut filter = Filter::new().inc::<Health>().exc::<Poisoned>();
        filter.register(&mut world).unwrap();
        assert_eq!(filter.count().unwrap(), 1);
        assert_eq!(filter.iter().unwrap().next(), Some(healthy));
    }

    #[test]
    fn conflicting_term_is_rejected() {
        let mut world = World::new();
        let mut filter = Filter::new().inc::<Health>().exc::<Health>();
        assert_eq!(
            filter.register(&mut world),
            Err(EcsError::ConflictingFilterTerm {
                type_name: std::any::type_name::<Health>(),
            })
        );
    }

    #[test]
    fn duplicate_add_is_rejected_without_side_effects() {
        let mut world = World::new();
        let mut filter = Filter::new().inc::<Health>();
        filter.register(&mut world).unwrap();

        let entity = world.create_entity();
        world.add_component::<Health>(entity).unwrap().0 = 5;
        assert!(matches!(
            world.add_component::<Health>(entity),
            Err(EcsError::DuplicateComponent { .. })
        ));
        assert_eq!(world.get_component::<Health>(entity).unwrap().0, 5);
        assert_eq!(filter.count().unwrap(), 1);
    }

    #[test]
    fn filter_survives_mask_growth_past_one_word() {
        let mut world = World::new();
        let mut filter = Filter::new().inc::<Health>();
        filter.register(&mut world).unwrap();

        let entity = world.create_entity();
        world.add_component::<Health>(entity).unwrap();
        assert_eq!(filter.count().unwrap(), 1);

        // Bind enough pools to push the mask width to a second word.
        macro_rules! bind_markers {
            ($($n:literal)+) => { $( world.bind_pool::<Marker<$n>>(); )+ };
        }
        bind_markers!(
            0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24
            25 26 27 28 29 30 31 32 33 34 35 36 37 38 39 40 41 42 43 44 45 46
            47 48 49 50 51 52 53 54 55 56 57 58 59 60 61 62 63
        );
        assert_eq!(world.pool_count(), 65);
        assert_eq!(world.allocator.word_count(), 2);

        // The pre-growth membership is intact, and a pool with a bit in the
        // second word participates in matching.
        assert_eq!(filter.count().unwrap(), 1);
        let mut wide = Filter::new().inc::<Health>().exc::<Marker<63>>();
        wide.register(&mut world).unwrap();
        assert_eq!(wide.count().unwrap(), 1);
        world.add_component::<Marker<63>>(entity).unwrap();
        assert_eq!(wide.count().unwrap(), 0);
        assert_eq!(filter.count().unwrap(), 1);
    }

    #[test]
    fn unbound_pool_access_reports_pool_not_bound() {
        let mut world = World::new();
        let entity = world.create_entity();
        assert_eq!(
            world.get_component::<Health>(entity).err(),
            Some(EcsError::PoolNotBound {
                type_name: std::any::type_name::<Health>(),
            })
        );
        assert!(!world.remove_component::<Health>(entity));
    }
}
