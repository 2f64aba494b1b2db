//! # One-Frame Components
//!
//! A one-frame component is an event in component form: a system adds it
//! during `run`, every later system in the same frame can react to it, and
//! it is cleared before the next frame starts.
//!
//! Clearing is driven by [`OneFrameSystem<T>`], scheduled once per event
//! type, after the systems that consume the event.

use std::marker::PhantomData;

use sigil_core::{Component, Filter, System, World};

/// Clears every `T` component at the end of each frame.
///
/// Scheduling position matters: systems scheduled after the clearer (or
/// adding `T` inside `post_run`) never observe the event.
pub struct OneFrameSystem<T: Component> {
    holders: Filter,
    _marker: PhantomData<T>,
}

impl<T: Component> OneFrameSystem<T> {
    /// A clearer for the one-frame component `T`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            holders: Filter::new().inc::<T>(),
            _marker: PhantomData,
        }
    }
}

impl<T: Component> Default for OneFrameSystem<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> System for OneFrameSystem<T> {
    fn init(&mut self, world: &mut World) {
        // A single-include filter has no conflicting terms; registration
        // can only fail if the world rejects it wholesale.
        if let Err(error) = self.holders.register(world) {
            tracing::error!(
                %error,
                component = std::any::type_name::<T>(),
                "failed to register one-frame clearer"
            );
        }
    }

    fn post_run(&mut self, world: &mut World) {
        let Ok(holders) = self.holders.iter() else {
            return;
        };
        for entity in holders {
            world.remove_component::<T>(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_core::Schedule;

    #[derive(Default)]
    struct Damaged(i32);

    #[derive(Default)]
    struct Health(i32);

    /// Deals damage on the first frame only.
    struct AttackOnce {
        done: bool,
        target: Option<sigil_core::Entity>,
    }

    impl System for AttackOnce {
        fn run(&mut self, world: &mut World) {
            if self.done {
                return;
            }
            self.done = true;
            let target = self.target.unwrap();
            world.add_component::<Damaged>(target).unwrap().0 = 30;
        }
    }

    /// Applies pending damage events to health.
    struct ApplyDamage;

    impl System for ApplyDamage {
        fn run(&mut self, world: &mut World) {
            let mut hits = Vec::new();
            let mut filter = Filter::new().inc::<Damaged>().inc::<Health>();
            filter.register(world).unwrap();
            for entity in filter.iter().unwrap() {
                let amount = world.get_component::<Damaged>(entity).unwrap().0;
                hits.push((entity, amount));
            }
            for (entity, amount) in hits {
                world.get_component_mut::<Health>(entity).unwrap().0 -= amount;
            }
        }
    }

    #[test]
    fn event_component_lives_exactly_one_frame() {
        let mut world = World::new();
        let target = world.create_entity();
        world.add_component::<Health>(target).unwrap().0 = 100;

        let mut schedule = Schedule::new()
            .with_system(AttackOnce {
                done: false,
                target: Some(target),
            })
            .with_system(ApplyDamage)
            .with_system(OneFrameSystem::<Damaged>::new());
        schedule.init(&mut world);

        schedule.run(&mut world);
        assert_eq!(world.get_component::<Health>(target).unwrap().0, 70);
        assert!(!world.has_component::<Damaged>(target));

        // No event on the second frame, so health is untouched.
        schedule.run(&mut world);
        assert_eq!(world.get_component::<Health>(target).unwrap().0, 70);
    }

    #[test]
    fn clearer_releases_entities_whose_only_component_was_the_event() {
        let mut world = World::new();
        let ghost = world.create_entity();
        world.add_component::<Damaged>(ghost).unwrap();

        let mut schedule = Schedule::new().with_system(OneFrameSystem::<Damaged>::new());
        schedule.init(&mut world);
        schedule.run(&mut world);

        assert!(!world.is_alive(ghost));
    }
}
