//! # Engine Error Types
//!
//! Every fallible operation in the crate reports through [`EcsError`].
//! Variants carry the identifiers needed to trace the failure back to a
//! concrete entity, pool or filter; they are cheap to clone and compare so
//! tests can assert on exact outcomes.

use thiserror::Error;

use crate::ecs::{Entity, PoolId};

/// Errors surfaced by world, pool and filter operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EcsError {
    /// A component of this type was added to an entity that already holds
    /// one in the same pool. Each pool stores at most one value per entity.
    #[error("entity {entity} already has a component in pool {pool}")]
    DuplicateComponent {
        /// The entity the duplicate add targeted.
        entity: Entity,
        /// The pool that already holds a value for the entity.
        pool: PoolId,
    },

    /// A component was read from or written through a pool that holds no
    /// value for the entity.
    #[error("entity {entity} has no component in pool {pool}")]
    MissingComponent {
        /// The entity the access targeted.
        entity: Entity,
        /// The pool that was queried.
        pool: PoolId,
    },

    /// A typed pool lookup found no pool bound for the component type.
    #[error("no pool bound for component type `{type_name}`")]
    PoolNotBound {
        /// The component type that has no pool.
        type_name: &'static str,
    },

    /// Count, iteration or callback installation was attempted on a filter
    /// that has not been registered with a world yet.
    #[error("filter is not registered with a world")]
    FilterNotRegistered,

    /// A filter listed the same component type as both an include and an
    /// exclude term. No entity could ever match such a signature.
    #[error("component type `{type_name}` is both included and excluded")]
    ConflictingFilterTerm {
        /// The contradicting component type.
        type_name: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_participants() {
        let entity = Entity::from_raw(7).unwrap();
        let err = EcsError::MissingComponent {
            entity,
            pool: PoolId::new(3),
        };
        assert_eq!(err.to_string(), "entity 7 has no component in pool 3");

        let err = EcsError::ConflictingFilterTerm { type_name: "Health" };
        assert!(err.to_string().contains("Health"));
    }
}
