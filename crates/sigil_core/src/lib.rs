//! # SIGIL Core Runtime
//!
//! An Entity Component System (ECS) built around incrementally maintained
//! filters:
//!
//! - Dense component pools with slot recycling and entity indirection
//! - Per-entity membership bitmasks, one bit per bound pool
//! - Standing filter queries updated on every component change, never
//!   rescanned
//! - Entity id recycling with implicit destruction on the last removal
//!
//! ## Architecture Rules
//!
//! 1. **Pay at mutation time** - Adding or removing a component re-checks
//!    registered filters once; iterating a filter is a dense array walk
//! 2. **Explicit wiring** - Pools bind on first use, filters register
//!    against a world; no global registries, no reflection
//! 3. **Mutation during traversal is legal** - A locked filter defers
//!    membership changes and replays them when the traversal ends
//!
//! ## Example
//!
//! ```rust,ignore
//! use sigil_core::{Filter, World};
//!
//! let mut world = World::new();
//! let mut filter = Filter::new().inc::<Position>().exc::<Frozen>();
//! filter.register(&mut world)?;
//!
//! let entity = world.create_entity();
//! world.add_component::<Position>(entity)?;
//! for entity in filter.iter()? {
//!     // safe to add/remove components here
//! }
//! ```

pub mod config;
pub mod ecs;
pub mod error;
pub mod system;

pub use config::{ConfigError, WorldConfig};
pub use ecs::{
    Component, ComponentPool, Entity, Filter, FilterEntities, FilterIds, PoolId, PoolMask,
    SparseSet, World, WORD_BITS,
};
pub use error::EcsError;
pub use system::{Schedule, System};
