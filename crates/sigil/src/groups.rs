//! # System Groups
//!
//! A [`SystemGroup`] bundles systems that switch on and off together - a
//! pause menu, a combat mode, a debug overlay. The group itself is a
//! [`System`], so it nests into a [`Schedule`](sigil_core::Schedule) like
//! any other system.
//!
//! Toggling goes through a [`GroupHandle`] captured at construction time.
//! Handles are explicit capabilities; there is no way to look a group up
//! by name or type at runtime.

use std::cell::Cell;
use std::rc::Rc;

use sigil_core::{System, World};

/// Shared activation state of one group.
#[derive(Clone, Copy, Debug, Default)]
struct GroupState {
    active: bool,
    deactivate_after_run: bool,
}

/// A cloneable toggle for a [`SystemGroup`].
///
/// All clones observe and control the same group.
#[derive(Clone, Debug)]
pub struct GroupHandle {
    state: Rc<Cell<GroupState>>,
    name: &'static str,
}

impl GroupHandle {
    /// Switches the group on until further notice.
    pub fn activate(&self) {
        self.state.set(GroupState {
            active: true,
            deactivate_after_run: false,
        });
        tracing::debug!(group = self.name, "group activated");
    }

    /// Switches the group on for exactly one frame; it deactivates itself
    /// after its next `post_run`.
    pub fn activate_once(&self) {
        self.state.set(GroupState {
            active: true,
            deactivate_after_run: true,
        });
        tracing::debug!(group = self.name, "group activated for one frame");
    }

    /// Switches the group off.
    pub fn deactivate(&self) {
        self.state.set(GroupState {
            active: false,
            deactivate_after_run: false,
        });
        tracing::debug!(group = self.name, "group deactivated");
    }

    /// `true` iff the group currently participates in frames.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.get().active
    }
}

/// A named bundle of systems sharing one activation toggle.
///
/// Lifecycle semantics relative to a plain system list:
/// - `init` and `dispose` always reach every member, active or not
/// - `run` and `post_run` are skipped entirely while inactive
/// - a one-frame activation clears itself after the group's `post_run`
pub struct SystemGroup {
    name: &'static str,
    systems: Vec<Box<dyn System>>,
    state: Rc<Cell<GroupState>>,
}

impl SystemGroup {
    /// An empty group, initially active.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            systems: Vec::new(),
            state: Rc::new(Cell::new(GroupState {
                active: true,
                deactivate_after_run: false,
            })),
        }
    }

    /// Builder-style variant of [`add_system`](Self::add_system).
    #[must_use]
    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.add_system(system);
        self
    }

    /// Appends a member system.
    pub fn add_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    /// The group's display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// A toggle for this group, usable from anywhere.
    #[must_use]
    pub fn handle(&self) -> GroupHandle {
        GroupHandle {
            state: Rc::clone(&self.state),
            name: self.name,
        }
    }
}

impl System for SystemGroup {
    fn init(&mut self, world: &mut World) {
        // Members set up their filters regardless of activation, so that a
        // later activation starts from current state.
        for system in &mut self.systems {
            system.init(world);
        }
    }

    fn run(&mut self, world: &mut World) {
        if !self.state.get().active {
            return;
        }
        for system in &mut self.systems {
            system.run(world);
        }
    }

    fn post_run(&mut self, world: &mut World) {
        let state = self.state.get();
        if !state.active {
            return;
        }
        for system in &mut self.systems {
            system.post_run(world);
        }
        if state.deactivate_after_run {
            self.state.set(GroupState {
                active: false,
                deactivate_after_run: false,
            });
            tracing::debug!(group = self.name, "one-frame group deactivated");
        }
    }

    fn dispose(&mut self, world: &mut World) {
        for system in &mut self.systems {
            system.dispose(world);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_core::Schedule;
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    struct Recorder {
        log: Log,
    }

    impl System for Recorder {
        fn init(&mut self, _world: &mut World) {
            self.log.borrow_mut().push("init");
        }
        fn run(&mut self, _world: &mut World) {
            self.log.borrow_mut().push("run");
        }
        fn post_run(&mut self, _world: &mut World) {
            self.log.borrow_mut().push("post");
        }
        fn dispose(&mut self, _world: &mut World) {
            self.log.borrow_mut().push("dispose");
        }
    }

    fn recorded_group() -> (SystemGroup, GroupHandle, Log) {
        let log: Log = Rc::default();
        let group = SystemGroup::new("recorder").with_system(Recorder {
            log: Rc::clone(&log),
        });
        let handle = group.handle();
        (group, handle, log)
    }

    #[test]
    fn inactive_group_skips_frames_but_not_init_or_dispose() {
        let (group, handle, log) = recorded_group();
        handle.deactivate();

        let mut world = World::new();
        let mut schedule = Schedule::new().with_system(group);
        schedule.init(&mut world);
        schedule.run(&mut world);
        schedule.dispose(&mut world);

        assert_eq!(*log.borrow(), ["init", "dispose"]);
    }

    #[test]
    fn reactivated_group_rejoins_frames() {
        let (group, handle, log) = recorded_group();
        let mut world = World::new();
        let mut schedule = Schedule::new().with_system(group);
        schedule.init(&mut world);

        schedule.run(&mut world);
        handle.deactivate();
        schedule.run(&mut world);
        handle.activate();
        schedule.run(&mut world);

        assert_eq!(*log.borrow(), ["init", "run", "post", "run", "post"]);
    }

    #[test]
    fn one_frame_activation_clears_after_post_run() {
        let (group, handle, log) = recorded_group();
        handle.deactivate();
        let mut world = World::new();
        let mut schedule = Schedule::new().with_system(group);
        schedule.init(&mut world);

        handle.activate_once();
        assert!(handle.is_active());
        schedule.run(&mut world);
        assert!(!handle.is_active());
        schedule.run(&mut world);

        assert_eq!(*log.borrow(), ["init", "run", "post"]);
    }
}
