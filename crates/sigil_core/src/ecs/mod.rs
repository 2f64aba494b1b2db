//! # Entity Component System
//!
//! An incremental-filter ECS built around three pieces of state:
//!
//! - Component pools: dense per-type storage with slot recycling
//! - Entity records: one membership bitmask per issued id
//! - Registered filters: standing queries kept current on every change
//!
//! ## Design Philosophy
//!
//! - Filters pay their cost at mutation time; iteration is a dense walk
//! - Entity ids are recycled through an explicit free list
//! - Mutation during filter traversal is legal and deferred, never UB
//! - All wiring is explicit; no global registries, no reflection

mod bits;
mod entity;
mod filter;
mod pool;
mod sparse;
mod world;

pub use bits::{PoolMask, WORD_BITS};
pub use entity::Entity;
pub use filter::{Filter, FilterEntities, FilterIds};
pub use pool::{Component, ComponentPool, PoolId};
pub use sparse::SparseSet;
pub use world::World;
