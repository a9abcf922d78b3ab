#![allow(missing_docs)]
//! Benchmarks for ticking long conduit chains.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

use conflux_core::World;
use conflux_registry::Registry;
use conflux_utils::{Direction, TeamId, TilePos};

/// Builds a world with one east-facing chain of `length` conduits, primed with water.
fn primed_chain(length: u32) -> World {
    let mut registry = Registry::with_vanilla();
    registry.freeze();
    let conduit = registry
        .blocks
        .get_by_name("plated-conduit")
        .expect("plated conduit is built in");
    let water = registry.liquids.get_by_name("water").expect("water is built in");

    let mut world = World::new(Arc::new(registry), length + 1, 3);
    for x in 0..length as i32 {
        world
            .place(TilePos::new(x, 1), conduit, Direction::East, TeamId::SHARDED)
            .expect("chain tile is free");
    }
    for x in (0..length as i32).step_by(4) {
        world.inject(TilePos::new(x, 1), water, 8.0);
    }
    world
}

fn bench_chain_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_tick");

    for length in [64, 512, 4096] {
        group.bench_with_input(BenchmarkId::new("conduits", length), &length, |b, &length| {
            let mut world = primed_chain(length);
            b.iter(|| black_box(world.tick(black_box(1.0))));
        });
    }

    group.finish();
}

fn bench_placement(c: &mut Criterion) {
    c.bench_function("place_chain_512", |b| {
        b.iter(|| black_box(primed_chain(black_box(512))));
    });
}

criterion_group!(benches, bench_chain_tick, bench_placement);
criterion_main!(benches);
