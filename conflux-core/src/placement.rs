//! Placement-time replacement of planned conduits.
//!
//! Plans are resolved before anything is committed to the world. A planned
//! conduit crossing another line becomes a junction, and a drag line that
//! runs into obstacles is bridged over them.

use conflux_registry::{Block, BlockId, BridgeReplacement};
use conflux_utils::{Direction, TilePos};

use crate::building::Building;
use crate::world::World;

/// Offset from one bridge end to the other, stored as the plan config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOffset {
    /// Horizontal distance.
    pub dx: i32,
    /// Vertical distance.
    pub dy: i32,
}

impl LinkOffset {
    /// Offset leading from `from` to `to`.
    #[must_use]
    pub const fn between(from: TilePos, to: TilePos) -> Self {
        Self {
            dx: to.x - from.x,
            dy: to.y - from.y,
        }
    }
}

/// A pending placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildPlan {
    /// Target tile.
    pub pos: TilePos,
    /// Facing direction.
    pub rotation: Direction,
    /// Block to place.
    pub block: BlockId,
    /// Link to another bridge end.
    pub config: Option<LinkOffset>,
    /// Removes whatever is on the tile instead of placing.
    pub breaking: bool,
}

impl BuildPlan {
    /// Plans to place `block` at `pos`.
    #[must_use]
    pub const fn new(pos: TilePos, rotation: Direction, block: BlockId) -> Self {
        Self {
            pos,
            rotation,
            block,
            config: None,
            breaking: false,
        }
    }

    /// Plans to deconstruct whatever stands at `pos`.
    #[must_use]
    pub const fn breaking(pos: TilePos, block: BlockId) -> Self {
        Self {
            pos,
            rotation: Direction::East,
            block,
            config: None,
            breaking: true,
        }
    }
}

/// Two bridge ends created for one drag line. Liquid crosses from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeLink {
    /// Input end.
    pub from: TilePos,
    /// Output end.
    pub to: TilePos,
}

fn carries_flow(world: &World, block: BlockId) -> bool {
    world
        .block(block)
        .is_some_and(|block| block.is_conduit() || block.is_junction())
}

/// Block `plan` should actually place, given the rest of its batch.
///
/// A conduit becomes its junction replacement when both the tile ahead and
/// the tile behind are planned with the same rotation, and another conduit
/// crosses the tile at a right angle, either committed or planned in the
/// same batch. Every check is a predicate over the whole batch, so the
/// result does not depend on plan order.
#[must_use]
pub fn replacement_for(world: &World, plan: &BuildPlan, batch: &[BuildPlan]) -> BlockId {
    if plan.breaking {
        return plan.block;
    }
    let Some(junction) = world
        .block(plan.block)
        .and_then(Block::as_conduit)
        .and_then(|config| config.junction_replacement)
    else {
        return plan.block;
    };

    let flanked = |direction: Direction| {
        let pos = plan.pos.relative(direction);
        batch.iter().any(|other| {
            !other.breaking
                && other.pos == pos
                && other.rotation == plan.rotation
                && carries_flow(world, other.block)
        })
    };
    if !flanked(plan.rotation) || !flanked(plan.rotation.opposite()) {
        return plan.block;
    }

    let committed_crossing = world
        .conduit_at(plan.pos)
        .is_some_and(|conduit| conduit.rotation().is_perpendicular(plan.rotation));
    let planned_crossing = batch.iter().any(|other| {
        !other.breaking
            && other.pos == plan.pos
            && other.rotation.is_perpendicular(plan.rotation)
            && world.block(other.block).is_some_and(Block::is_conduit)
    });

    if committed_crossing || planned_crossing {
        log::debug!("Plan at {} crosses another line, placing a junction", plan.pos);
        junction
    } else {
        plan.block
    }
}

/// Replaces every plan of the batch whose tile needs a junction.
///
/// All decisions are made against the batch as it was passed in. Returns the
/// resolved block of every plan, in order.
pub fn resolve_batch(world: &World, plans: &mut [BuildPlan]) -> Vec<BlockId> {
    let snapshot: &[BuildPlan] = plans;
    let resolved: Vec<BlockId> = snapshot
        .iter()
        .map(|plan| replacement_for(world, plan, snapshot))
        .collect();
    for (plan, block) in plans.iter_mut().zip(&resolved) {
        plan.block = *block;
    }
    resolved
}

/// Whether a drag line runs sideways to the rotation of its plans.
fn is_side_place(plans: &[BuildPlan]) -> bool {
    match plans {
        [first, second, ..] => first
            .pos
            .absolute_relative_to(second.pos)
            .is_some_and(|direction| direction.is_perpendicular(first.rotation)),
        _ => false,
    }
}

fn placeable(world: &World, plan: &BuildPlan) -> bool {
    world.tile_in_bounds(plan.pos)
        && world
            .building_at(plan.pos)
            .is_none_or(|building| building.block() == plan.block)
}

const fn positions_valid(from: TilePos, to: TilePos, range: u32) -> bool {
    if from.x == to.x {
        from.y.abs_diff(to.y) <= range
    } else if from.y == to.y {
        from.x.abs_diff(to.x) <= range
    } else {
        false
    }
}

/// Bridges a straight drag line of conduit plans over obstacles.
///
/// Walks the line; where a placeable plan is followed by an unplaceable one,
/// the next placeable plan within bridge range becomes the far end and the
/// plans in between are dropped. When no end is in range the skipped plans
/// are kept as they were and the walk resumes past them. Lines placed
/// sideways, lines that are not straight, and conduits without a bridge
/// replacement are left untouched.
pub fn handle_placement_line(world: &World, plans: &mut Vec<BuildPlan>) -> Vec<BridgeLink> {
    let (Some(first), Some(last)) = (plans.first().copied(), plans.last().copied()) else {
        return Vec::new();
    };
    let Some(bridge) = world
        .block(first.block)
        .and_then(Block::as_conduit)
        .and_then(|config| config.bridge_replacement)
    else {
        return Vec::new();
    };
    if is_side_place(plans) || !(first.pos.x == last.pos.x || first.pos.y == last.pos.y) {
        return Vec::new();
    }

    let rotated = first.pos.absolute_relative_to(last.pos) == Some(first.rotation.opposite());
    let range = bridge.range();
    let mut source = std::mem::take(plans);
    let mut result = Vec::with_capacity(source.len());
    let mut links = Vec::new();

    let mut i = 0;
    'outer: while i < source.len() {
        let cur = source[i];
        result.push(cur);

        let gap = i + 1 < source.len()
            && placeable(world, &cur)
            && !placeable(world, &source[i + 1]);
        if !gap {
            i += 1;
            continue;
        }

        for j in i + 1..source.len() {
            let other = source[j];
            if !positions_valid(cur.pos, other.pos, range) {
                result.extend_from_slice(&source[i + 1..j]);
                i = j;
                continue 'outer;
            }
            if placeable(world, &other) {
                let near = result.len() - 1;
                result[near].block = bridge.block();
                source[j].block = bridge.block();

                let link = if rotated {
                    BridgeLink {
                        from: other.pos,
                        to: cur.pos,
                    }
                } else {
                    BridgeLink {
                        from: cur.pos,
                        to: other.pos,
                    }
                };
                if let BridgeReplacement::ItemBridge { .. } = bridge {
                    let offset = LinkOffset::between(link.from, link.to);
                    if rotated {
                        source[j].config = Some(offset);
                    } else {
                        result[near].config = Some(offset);
                    }
                }
                log::debug!("Bridging drag line from {} to {}", link.from, link.to);
                links.push(link);
                i = j;
                continue 'outer;
            }
        }

        // Nothing placeable within range until the end of the line.
        result.extend_from_slice(&source[i + 1..]);
        break;
    }

    *plans = result;
    links
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use conflux_registry::Registry;
    use conflux_utils::TeamId;

    use super::*;

    struct Fixture {
        world: World,
        conduit: BlockId,
        reinforced: BlockId,
        junction: BlockId,
        bridge: BlockId,
        duct_bridge: BlockId,
        wall: BlockId,
    }

    fn fixture() -> Fixture {
        let mut registry = Registry::with_vanilla();
        registry.freeze();
        let id = |name: &str| registry.blocks.get_by_name(name).expect("vanilla block");
        let conduit = id("conduit");
        let reinforced = id("reinforced-conduit");
        let junction = id("liquid-junction");
        let bridge = id("bridge-conduit");
        let duct_bridge = id("reinforced-bridge-conduit");
        let wall = id("copper-wall");
        Fixture {
            world: World::new(Arc::new(registry), 16, 16),
            conduit,
            reinforced,
            junction,
            bridge,
            duct_bridge,
            wall,
        }
    }

    fn line(block: BlockId, rotation: Direction, from: TilePos, to: TilePos) -> Vec<BuildPlan> {
        let step = from.absolute_relative_to(to).expect("straight line");
        let mut plans = vec![BuildPlan::new(from, rotation, block)];
        let mut pos = from;
        while pos != to {
            pos = pos.relative(step);
            plans.push(BuildPlan::new(pos, rotation, block));
        }
        plans
    }

    fn crossing_batch(block: BlockId) -> Vec<BuildPlan> {
        let mut batch = line(block, Direction::East, TilePos::new(1, 3), TilePos::new(5, 3));
        batch.extend(line(block, Direction::North, TilePos::new(3, 1), TilePos::new(3, 5)));
        batch
    }

    fn walls(fixture: &mut Fixture, xs: std::ops::RangeInclusive<i32>, y: i32) {
        for x in xs {
            fixture
                .world
                .place(TilePos::new(x, y), fixture.wall, Direction::East, TeamId::SHARDED)
                .expect("wall");
        }
    }

    #[test]
    fn test_crossing_plans_become_junctions() {
        let fixture = fixture();
        let mut batch = crossing_batch(fixture.conduit);
        let resolved = resolve_batch(&fixture.world, &mut batch);

        let center = TilePos::new(3, 3);
        for (plan, block) in batch.iter().zip(&resolved) {
            if plan.pos == center {
                assert_eq!(*block, fixture.junction);
            } else {
                assert_eq!(*block, fixture.conduit);
            }
        }
        assert_eq!(batch.iter().filter(|plan| plan.block == fixture.junction).count(), 2);
    }

    #[test]
    fn test_unflanked_crossing_stays_plain() {
        let fixture = fixture();
        let center = TilePos::new(3, 3);
        let mut batch = vec![
            BuildPlan::new(center, Direction::East, fixture.conduit),
            BuildPlan::new(center, Direction::North, fixture.conduit),
        ];
        let resolved = resolve_batch(&fixture.world, &mut batch);
        assert_eq!(resolved, vec![fixture.conduit, fixture.conduit]);
    }

    #[test]
    fn test_committed_crossing_becomes_junction() {
        let mut fixture = fixture();
        let center = TilePos::new(3, 3);
        fixture
            .world
            .place(center, fixture.conduit, Direction::North, TeamId::SHARDED)
            .expect("place");
        let batch = line(fixture.conduit, Direction::East, TilePos::new(2, 3), TilePos::new(4, 3));
        assert_eq!(replacement_for(&fixture.world, &batch[1], &batch), fixture.junction);
        assert_eq!(replacement_for(&fixture.world, &batch[0], &batch), fixture.conduit);
    }

    #[test]
    fn test_parallel_committed_conduit_is_not_a_crossing() {
        let mut fixture = fixture();
        let center = TilePos::new(3, 3);
        fixture
            .world
            .place(center, fixture.conduit, Direction::West, TeamId::SHARDED)
            .expect("place");
        let batch = line(fixture.conduit, Direction::East, TilePos::new(2, 3), TilePos::new(4, 3));
        assert_eq!(replacement_for(&fixture.world, &batch[1], &batch), fixture.conduit);
    }

    #[test]
    fn test_resolution_ignores_plan_order() {
        let fixture = fixture();
        let mut forward = crossing_batch(fixture.conduit);
        let mut backward: Vec<BuildPlan> = forward.iter().rev().copied().collect();
        resolve_batch(&fixture.world, &mut forward);
        resolve_batch(&fixture.world, &mut backward);
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_no_junction_configured_never_replaces() {
        let fixture = fixture();
        let mut batch = crossing_batch(fixture.reinforced);
        let resolved = resolve_batch(&fixture.world, &mut batch);
        assert!(resolved.iter().all(|block| *block == fixture.reinforced));
    }

    #[test]
    fn test_bridge_over_wall() {
        let mut fixture = fixture();
        walls(&mut fixture, 3..=3, 1);
        let mut plans = line(fixture.conduit, Direction::East, TilePos::new(0, 1), TilePos::new(6, 1));
        let links = handle_placement_line(&fixture.world, &mut plans);

        assert_eq!(
            links,
            vec![BridgeLink {
                from: TilePos::new(2, 1),
                to: TilePos::new(4, 1),
            }]
        );
        let xs: Vec<i32> = plans.iter().map(|plan| plan.pos.x).collect();
        assert_eq!(xs, vec![0, 1, 2, 4, 5, 6]);
        assert_eq!(plans[2].block, fixture.bridge);
        assert_eq!(plans[2].config, Some(LinkOffset { dx: 2, dy: 0 }));
        assert_eq!(plans[3].block, fixture.bridge);
        assert_eq!(plans[3].config, None);
        assert_eq!(plans[4].block, fixture.conduit);
    }

    #[test]
    fn test_backwards_line_stores_link_on_far_end() {
        let mut fixture = fixture();
        walls(&mut fixture, 3..=3, 1);
        let mut plans = line(fixture.conduit, Direction::East, TilePos::new(6, 1), TilePos::new(0, 1));
        let links = handle_placement_line(&fixture.world, &mut plans);

        assert_eq!(
            links,
            vec![BridgeLink {
                from: TilePos::new(2, 1),
                to: TilePos::new(4, 1),
            }]
        );
        let far = plans
            .iter()
            .find(|plan| plan.pos == TilePos::new(2, 1))
            .expect("far end kept");
        assert_eq!(far.block, fixture.bridge);
        assert_eq!(far.config, Some(LinkOffset { dx: 2, dy: 0 }));
    }

    #[test]
    fn test_obstacle_out_of_range_keeps_plans() {
        let mut fixture = fixture();
        walls(&mut fixture, 3..=8, 1);
        let mut plans = line(fixture.conduit, Direction::East, TilePos::new(0, 1), TilePos::new(12, 1));
        let original = plans.clone();
        let links = handle_placement_line(&fixture.world, &mut plans);
        assert!(links.is_empty());
        assert_eq!(plans, original);
    }

    #[test]
    fn test_duct_bridge_has_no_config() {
        let mut fixture = fixture();
        walls(&mut fixture, 3..=4, 1);
        let mut plans =
            line(fixture.reinforced, Direction::East, TilePos::new(0, 1), TilePos::new(7, 1));
        let links = handle_placement_line(&fixture.world, &mut plans);
        assert_eq!(links.len(), 1);
        let ends: Vec<&BuildPlan> = plans
            .iter()
            .filter(|plan| plan.block == fixture.duct_bridge)
            .collect();
        assert_eq!(ends.len(), 2);
        assert!(ends.iter().all(|plan| plan.config.is_none()));
        assert_eq!(plans.len(), 6);
    }

    #[test]
    fn test_side_placement_is_untouched() {
        let mut fixture = fixture();
        walls(&mut fixture, 1..=1, 3);
        let mut plans = line(fixture.conduit, Direction::East, TilePos::new(1, 0), TilePos::new(1, 6));
        let original = plans.clone();
        assert!(handle_placement_line(&fixture.world, &mut plans).is_empty());
        assert_eq!(plans, original);
    }
}
