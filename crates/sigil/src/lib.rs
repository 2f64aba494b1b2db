//! # SIGIL Gameplay Layer
//!
//! Conveniences built on top of [`sigil_core`]:
//!
//! - [`SystemGroup`]: bundles of systems toggled together through explicit
//!   handles
//! - [`OneFrameSystem`]: event-like components cleared at the end of every
//!   frame
//!
//! The core crate's types are re-exported, so gameplay code depends on
//! this crate alone.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sigil::{OneFrameSystem, Schedule, SystemGroup, World};
//!
//! let combat = SystemGroup::new("combat")
//!     .with_system(ResolveAttacks)
//!     .with_system(OneFrameSystem::<Damaged>::new());
//! let combat_toggle = combat.handle();
//!
//! let mut schedule = Schedule::new().with_system(combat);
//! combat_toggle.deactivate(); // pause combat without touching the schedule
//! ```

pub mod groups;
pub mod one_frame;

pub use groups::{GroupHandle, SystemGroup};
pub use one_frame::OneFrameSystem;

pub use sigil_core::{
    Component, ComponentPool, ConfigError, EcsError, Entity, Filter, FilterEntities, FilterIds,
    PoolId, PoolMask, Schedule, SparseSet, System, World, WorldConfig, WORD_BITS,
};
