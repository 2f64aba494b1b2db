//! # Filter Maintenance Benchmark
//!
//! Measures the cost model the engine promises:
//! - Component add/remove pays for filter re-evaluation
//! - Filter iteration is a dense array walk
//! - Entity churn recycles ids instead of growing tables
//!
//! Run with: `cargo bench --package sigil_core`

// Benchmarks don't need docs, and marker component fields go unread
#![allow(missing_docs)]
#![allow(dead_code)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sigil_core::{Filter, World, WorldConfig};

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

#[derive(Default)]
struct Frozen;

fn sized_config(entities: usize) -> WorldConfig {
    WorldConfig {
        entity_capacity: entities,
        component_capacity: entities,
        filter_entity_range: entities,
        filter_dense_capacity: entities,
    }
}

/// A world where every entity holds `Position` and every other entity also
/// holds `Velocity`, plus a registered movers filter.
fn populated_world(entities: usize) -> (World, Filter) {
    let mut world = World::with_config(sized_config(entities));
    let mut movers = Filter::new().inc::<Position>().inc::<Velocity>().exc::<Frozen>();
    movers.register(&mut world).unwrap();
    for i in 0..entities {
        let entity = world.create_entity();
        world.add_component::<Position>(entity).unwrap();
        if i % 2 == 0 {
            world.add_component::<Velocity>(entity).unwrap();
        }
    }
    (world, movers)
}

/// Benchmark: add one component while filters watch the affected pools.
fn bench_add_with_filter_maintenance(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_component_with_filters");

    for entities in [1_000, 10_000, 100_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(entities),
            &entities,
            |b, &entities| {
                let (mut world, _movers) = populated_world(entities);
                let entity = world.create_entity();
                world.add_component::<Position>(entity).unwrap();
                b.iter(|| {
                    world.add_component::<Velocity>(entity).unwrap();
                    world.remove_component::<Velocity>(entity);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: walk every entity matched by the movers filter.
fn bench_filter_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_iteration");

    for entities in [1_000, 10_000, 100_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(entities),
            &entities,
            |b, &entities| {
                let (mut world, movers) = populated_world(entities);
                b.iter(|| {
                    let mut sum = 0.0f32;
                    for entity in movers.iter().unwrap() {
                        let position = world.get_component_mut::<Position>(entity).unwrap();
                        position.x += 1.0;
                        sum += position.y;
                    }
                    black_box(sum)
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: full create/destroy churn exercising the id free list.
fn bench_entity_churn(c: &mut Criterion) {
    c.bench_function("entity_churn_1k", |b| {
        let (mut world, _movers) = populated_world(1_000);
        b.iter(|| {
            let mut last = None;
            for _ in 0..1_000 {
                let entity = world.create_entity();
                world.add_component::<Frozen>(entity).unwrap();
                world.remove_component::<Frozen>(entity);
                last = Some(entity);
            }
            black_box(last)
        });
    });
}

criterion_group!(
    benches,
    bench_add_with_filter_maintenance,
    bench_filter_iteration,
    bench_entity_churn
);
criterion_main!(benches);
