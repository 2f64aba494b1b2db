//! # Systems and Schedules
//!
//! A [`System`] is a unit of behavior driven against a [`World`]; a
//! [`Schedule`] runs a fixed list of systems in insertion order through a
//! four-phase lifecycle:
//!
//! ```text
//!   init      once, before the first frame
//!   run       every frame, in order
//!   post_run  every frame, after *all* runs of that frame
//!   dispose   once, at shutdown
//! ```
//!
//! The split between `run` and `post_run` lets a system publish state in
//! the first phase and clean up in the second, after every other system has
//! observed it.

use crate::ecs::World;

/// A unit of behavior scheduled against a world.
///
/// Every phase has an empty default body, so implementors override only the
/// phases they participate in.
pub trait System {
    /// One-time setup before the first frame.
    fn init(&mut self, _world: &mut World) {}

    /// Per-frame work.
    fn run(&mut self, _world: &mut World) {}

    /// Per-frame work after every system's [`run`](System::run) of the
    /// frame has completed.
    fn post_run(&mut self, _world: &mut World) {}

    /// One-time teardown at shutdown.
    fn dispose(&mut self, _world: &mut World) {}
}

/// An ordered list of systems with a shared lifecycle.
#[derive(Default)]
pub struct Schedule {
    systems: Vec<Box<dyn System>>,
}

impl Schedule {
    /// An empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`add_system`](Self::add_system).
    #[must_use]
    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.add_system(system);
        self
    }

    /// Appends a system; it runs after every system added before it.
    pub fn add_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    /// Number of scheduled systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// `true` iff no systems are scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Runs every system's `init`, in order.
    pub fn init(&mut self, world: &mut World) {
        tracing::debug!(systems = self.systems.len(), "initializing schedule");
        for system in &mut self.systems {
            system.init(world);
        }
    }

    /// Runs one frame: every `run` in order, then every `post_run` in
    /// order.
    pub fn run(&mut self, world: &mut World) {
        for system in &mut self.systems {
            system.run(world);
        }
        for system in &mut self.systems {
            system.post_run(world);
        }
    }

    /// Runs every system's `dispose`, in order.
    pub fn dispose(&mut self, world: &mut World) {
        for system in &mut self.systems {
            system.dispose(world);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Tracer {
        name: &'static str,
        log: Log,
    }

    impl Tracer {
        fn record(&self, phase: &str) {
            self.log.borrow_mut().push(format!("{}:{phase}", self.name));
        }
    }

    impl System for Tracer {
        fn init(&mut self, _world: &mut World) {
            self.record("init");
        }
        fn run(&mut self, _world: &mut World) {
            self.record("run");
        }
        fn post_run(&mut self, _world: &mut World) {
            self.record("post");
        }
        fn dispose(&mut self, _world: &mut World) {
            self.record("dispose");
        }
    }

    #[test]
    fn phases_run_in_insertion_order_and_post_runs_after_all_runs() {
        let log: Log = Rc::default();
        let mut schedule = Schedule::new()
            .with_system(Tracer {
                name: "a",
                log: Rc::clone(&log),
            })
            .with_system(Tracer {
                name: "b",
                log: Rc::clone(&log),
            });
        let mut world = World::new();

        schedule.init(&mut world);
        schedule.run(&mut world);
        schedule.dispose(&mut world);

        assert_eq!(
            *log.borrow(),
            [
                "a:init", "b:init", "a:run", "b:run", "a:post", "b:post", "a:dispose",
                "b:dispose"
            ]
        );
    }

    #[test]
    fn default_phase_bodies_are_no_ops() {
        struct Inert;
        impl System for Inert {}

        let mut schedule = Schedule::new().with_system(Inert);
        let mut world = World::new();
        schedule.init(&mut world);
        schedule.run(&mut world);
        schedule.dispose(&mut world);
        assert_eq!(schedule.len(), 1);
    }
}
