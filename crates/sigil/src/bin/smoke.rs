//! # sigil smoke — Logged End-to-End Run
//!
//! Drives a tiny simulation through every engine surface: entity creation,
//! component churn, filter traversal, system groups and one-frame events.
//! Useful for eyeballing the trace output:
//!
//! ```text
//! RUST_LOG=sigil=debug,sigil_core=trace cargo run --bin smoke
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;

use sigil::{Filter, OneFrameSystem, Schedule, System, SystemGroup, World};

#[derive(Default)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Default)]
struct Velocity {
    dx: f32,
    dy: f32,
}

/// Fired on an entity when it crosses x = 10.
#[derive(Default)]
struct CrossedBoundary;

/// Integrates velocity into position and raises boundary events.
struct Movement {
    movers: Filter,
}

impl System for Movement {
    fn init(&mut self, world: &mut World) {
        self.movers
            .register(world)
            .unwrap_or_else(|error| tracing::error!(%error, "movement filter rejected"));
    }

    fn run(&mut self, world: &mut World) {
        let Ok(movers) = self.movers.iter() else {
            return;
        };
        let mut crossed = Vec::new();
        for entity in movers {
            let Ok(&Velocity { dx, dy }) = world.get_component::<Velocity>(entity) else {
                continue;
            };
            if let Ok(position) = world.get_component_mut::<Position>(entity) {
                position.x += dx;
                position.y += dy;
                if position.x >= 10.0 {
                    crossed.push(entity);
                }
            }
        }
        for entity in crossed {
            if !world.has_component::<CrossedBoundary>(entity) {
                let _ = world.add_component::<CrossedBoundary>(entity);
            }
        }
    }
}

/// Logs boundary crossings raised earlier in the frame.
struct ReportCrossings {
    crossings: Filter,
}

impl System for ReportCrossings {
    fn init(&mut self, world: &mut World) {
        self.crossings
            .register(world)
            .unwrap_or_else(|error| tracing::error!(%error, "crossing filter rejected"));
    }

    fn run(&mut self, world: &mut World) {
        let Ok(crossers) = self.crossings.iter() else {
            return;
        };
        for entity in crossers {
            let x = world
                .get_component::<Position>(entity)
                .map(|p| p.x)
                .unwrap_or_default();
            info!(entity = entity.id(), x, "entity crossed the boundary");
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut world = World::new();

    let simulation = SystemGroup::new("simulation")
        .with_system(Movement {
            movers: Filter::new().inc::<Position>().inc::<Velocity>(),
        })
        .with_system(ReportCrossings {
            crossings: Filter::new().inc::<CrossedBoundary>(),
        })
        .with_system(OneFrameSystem::<CrossedBoundary>::new());
    let simulation_toggle = simulation.handle();

    let mut schedule = Schedule::new().with_system(simulation);
    schedule.init(&mut world);

    for i in 0..4 {
        let entity = world.create_entity();
        if let Ok(position) = world.add_component::<Position>(entity) {
            position.x = i as f32;
        }
        if let Ok(velocity) = world.add_component::<Velocity>(entity) {
            velocity.dx = 1.0 + i as f32;
        }
    }
    info!(entities = world.entity_count(), "world populated");

    for frame in 0..5 {
        info!(frame, "frame start");
        schedule.run(&mut world);
    }

    // Pause the whole simulation group and show that frames become free.
    simulation_toggle.deactivate();
    schedule.run(&mut world);
    info!(
        entities = world.entity_count(),
        recycled = world.recycled_count(),
        "simulation paused"
    );

    schedule.dispose(&mut world);
}
