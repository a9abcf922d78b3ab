//! End-to-end scenarios: plan, resolve, commit, then simulate.

use std::sync::Arc;

use conflux_core::building::Building;
use conflux_core::placement::{handle_placement_line, resolve_batch};
use conflux_core::{BuildPlan, ConduitSave, World};
use conflux_registry::{BlockId, LiquidId, Registry};
use conflux_utils::{Direction, TeamId, TilePos};

struct Scenario {
    world: World,
    conduit: BlockId,
    junction: BlockId,
    bridge: BlockId,
    wall: BlockId,
    water: LiquidId,
}

fn scenario(width: u32, height: u32) -> Scenario {
    let mut registry = Registry::with_vanilla();
    registry.freeze();
    let block = |name: &str| registry.blocks.get_by_name(name).expect("vanilla block");
    let conduit = block("conduit");
    let junction = block("liquid-junction");
    let bridge = block("bridge-conduit");
    let wall = block("copper-wall");
    let water = registry.liquids.get_by_name("water").expect("water");
    Scenario {
        world: World::new(Arc::new(registry), width, height),
        conduit,
        junction,
        bridge,
        wall,
        water,
    }
}

fn drag(block: BlockId, rotation: Direction, y: i32, xs: std::ops::Range<i32>) -> Vec<BuildPlan> {
    xs.map(|x| BuildPlan::new(TilePos::new(x, y), rotation, block))
        .collect()
}

#[test]
fn test_crossing_lines_commit_with_junction() {
    let mut scenario = scenario(8, 8);
    let mut batch = drag(scenario.conduit, Direction::East, 3, 1..6);
    batch.extend((1..6).map(|y| BuildPlan::new(TilePos::new(3, y), Direction::North, scenario.conduit)));

    resolve_batch(&scenario.world, &mut batch);
    scenario
        .world
        .commit_plans(&batch, TeamId::SHARDED)
        .expect("commit");

    let center = scenario
        .world
        .building_at(TilePos::new(3, 3))
        .expect("center is built");
    assert_eq!(center.block(), scenario.junction);

    let feeder = scenario
        .world
        .conduit_at(TilePos::new(2, 3))
        .expect("feeder conduit");
    assert!(!feeder.front_capped());
}

#[test]
fn test_bridged_line_feeds_up_to_the_bridge() {
    let mut scenario = scenario(12, 4);
    scenario
        .world
        .place(TilePos::new(5, 1), scenario.wall, Direction::East, TeamId::SHARDED)
        .expect("wall");

    let mut plans = drag(scenario.conduit, Direction::East, 1, 0..10);
    let links = handle_placement_line(&scenario.world, &mut plans);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].from, TilePos::new(4, 1));
    assert_eq!(links[0].to, TilePos::new(6, 1));

    resolve_batch(&scenario.world, &mut plans);
    scenario
        .world
        .commit_plans(&plans, TeamId::SHARDED)
        .expect("commit");
    assert_eq!(
        scenario.world.building_at(TilePos::new(4, 1)).map(|b| b.block()),
        Some(scenario.bridge)
    );

    scenario.world.inject(TilePos::new(0, 1), scenario.water, 10.0);
    for _ in 0..240 {
        scenario.world.tick(1.0);
        for x in 0..4 {
            let amount = scenario
                .world
                .conduit_at(TilePos::new(x, 1))
                .expect("conduit")
                .liquid_container()
                .amount();
            assert!((0.0..=10.0).contains(&amount));
        }
    }

    // The conduit feeding the bridge end is blocked, so nothing was lost.
    assert!((scenario.world.total_liquid(scenario.water) - 10.0).abs() < 1e-3);
    let last = scenario
        .world
        .conduit_at(TilePos::new(3, 1))
        .expect("conduit")
        .liquid_container()
        .amount();
    assert!(last > 0.0);
}

#[test]
fn test_leaking_line_drains_and_goes_idle() {
    let mut scenario = scenario(8, 3);
    let plans = drag(scenario.conduit, Direction::East, 1, 0..4);
    scenario
        .world
        .commit_plans(&plans, TeamId::SHARDED)
        .expect("commit");
    scenario.world.inject(TilePos::new(0, 1), scenario.water, 10.0);

    let mut leaked = 0.0;
    for _ in 0..600 {
        leaked += scenario.world.tick(1.0).leaked;
    }
    assert!(leaked > 9.9);
    assert!(scenario.world.total_liquid(scenario.water) < 0.01);

    let stats = scenario.world.tick(1.0);
    assert_eq!(stats.updated, 0);
    assert_eq!(stats.skipped, 4);
}

#[test]
fn test_saved_state_survives_serialization() {
    let mut scenario = scenario(4, 4);
    let pos = TilePos::new(1, 1);
    scenario
        .world
        .place(pos, scenario.conduit, Direction::West, TeamId::SHARDED)
        .expect("place");
    scenario.world.inject(pos, scenario.water, 3.5);

    let save = scenario.world.conduit_at(pos).expect("conduit").save();
    let json = serde_json::to_string(&save).expect("serialize");
    let loaded: ConduitSave = serde_json::from_str(&json).expect("deserialize");
    scenario.world.remove(pos).expect("remove");
    scenario
        .world
        .load_conduit(pos, scenario.conduit, TeamId::SHARDED, loaded)
        .expect("load");

    let conduit = scenario.world.conduit_at(pos).expect("conduit");
    assert_eq!(conduit.rotation(), Direction::West);
    assert!((conduit.liquid_container().get(scenario.water) - 3.5).abs() < f32::EPSILON);
}
