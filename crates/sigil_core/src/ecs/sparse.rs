//! # Sparse Set
//!
//! O(1) membership, insert and delete over a bounded integer domain, with
//! dense cache-friendly iteration. Backs every registered filter's matched
//! set.
//!
//! ```text
//! sparse: [ _, 0, _, 1, ... ]   <- indexed by entity index, stores dense slot
//! dense:  [ e2, e4 ]            <- packed entities, iterated in order
//! ```
//!
//! Deletion swap-removes from the dense array, so iteration order is
//! insertion order only until the first removal.

use super::entity::Entity;

/// Sparse set of entities.
///
/// The sparse side is indexed by `Entity::index()` and must be grown
/// (`grow_range`) before entities with larger indices are inserted; the dense
/// side grows on demand.
#[derive(Debug, Default)]
pub struct SparseSet {
    /// Entity index -> dense slot. Stale entries are disambiguated through
    /// the dense array, so this never needs clearing on removal.
    sparse: Vec<u32>,
    /// Packed member entities.
    dense: Vec<Entity>,
}

impl SparseSet {
    /// Creates a set addressing entity indices below `entity_range`, with
    /// room for `capacity` members before the dense side reallocates.
    #[must_use]
    pub fn new(entity_range: usize, capacity: usize) -> Self {
        Self {
            sparse: vec![0; entity_range],
            dense: Vec::with_capacity(capacity),
        }
    }

    /// O(1) membership test.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        let index = entity.index();
        if index >= self.sparse.len() {
            return false;
        }
        let slot = self.sparse[index] as usize;
        slot < self.dense.len() && self.dense[slot] == entity
    }

    /// Inserts `entity`, returning `true` if it was not already a member.
    ///
    /// The entity's index must be inside the addressed range; the allocator
    /// extends the range before issuing larger ids.
    pub fn insert(&mut self, entity: Entity) -> bool {
        if self.contains(entity) {
            return false;
        }
        let index = entity.index();
        // Range growth happens before larger ids are issued; an index past
        // the sparse side is a growth-ordering bug, not a recoverable state.
        debug_assert!(
            index < self.sparse.len(),
            "entity {entity} outside sparse range {}",
            self.sparse.len()
        );
        self.sparse[index] = self.dense.len() as u32;
        self.dense.push(entity);
        true
    }

    /// Removes `entity`, returning `true` if it was a member.
    ///
    /// Swap-removes from the dense array and repoints the moved entity's
    /// sparse entry.
    pub fn remove(&mut self, entity: Entity) -> bool {
        if !self.contains(entity) {
            return false;
        }
        let slot = self.sparse[entity.index()] as usize;
        self.dense.swap_remove(slot);
        if let Some(moved) = self.dense.get(slot) {
            self.sparse[moved.index()] = slot as u32;
        }
        true
    }

    /// Number of members.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// `true` iff the set has no members.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Member at dense position `slot`, if any.
    #[inline]
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<Entity> {
        self.dense.get(slot).copied()
    }

    /// Iterates members in dense order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.dense.iter().copied()
    }

    /// Extends the addressed entity range to `entity_range` indices.
    pub fn grow_range(&mut self, entity_range: usize) {
        if entity_range > self.sparse.len() {
            self.sparse.resize(entity_range, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(id: u32) -> Entity {
        Entity::from_raw(id).unwrap()
    }

    #[test]
    fn insert_contains_remove() {
        let mut set = SparseSet::new(16, 4);
        assert!(set.insert(e(3)));
        assert!(!set.insert(e(3)));
        assert!(set.contains(e(3)));
        assert!(!set.contains(e(4)));
        assert_eq!(set.len(), 1);

        assert!(set.remove(e(3)));
        assert!(!set.remove(e(3)));
        assert!(set.is_empty());
    }

    #[test]
    fn swap_remove_repoints_moved_member() {
        let mut set = SparseSet::new(16, 4);
        set.insert(e(1));
        set.insert(e(2));
        set.insert(e(3));

        assert!(set.remove(e(1)));
        // e3 was swapped into e1's dense slot and must still be resolvable.
        assert!(set.contains(e(3)));
        assert!(set.contains(e(2)));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0), Some(e(3)));
    }

    #[test]
    fn range_growth_admits_larger_indices() {
        let mut set = SparseSet::new(2, 2);
        assert!(!set.contains(e(9)));
        set.grow_range(9);
        assert!(set.insert(e(9)));
        assert!(set.contains(e(9)));
    }

    #[test]
    fn stale_sparse_entry_is_not_a_member() {
        let mut set = SparseSet::new(8, 4);
        set.insert(e(5));
        set.remove(e(5));
        // The sparse entry for e5 is stale but must not read as membership.
        set.insert(e(1));
        assert!(!set.contains(e(5)));
    }
}
