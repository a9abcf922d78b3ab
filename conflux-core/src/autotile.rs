//! Adjacency inference for conduits.
//!
//! A conduit never stores links to its neighbours. Its shape is derived from
//! the four adjacent tiles every time one of them changes, and the result is
//! cached on the building until the next proximity update.

use conflux_registry::Block;
use conflux_utils::{Direction, TeamId, TilePos};

use crate::building::Building;
use crate::placement::BuildPlan;
use crate::world::World;

/// Shape of a conduit tile as derived from its neighbours.
///
/// Slot `i` of the masks refers to the neighbour in direction
/// `rotation - i`: 0 is the front, 1 the right, 2 the back and 3 the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilingDescriptor {
    /// 0 straight, 1 single side input, 2 corner, 3 tee, 4 cross-through.
    pub shape: u8,
    /// Horizontal mirroring, always 1 for conduits.
    pub x_scale: i8,
    /// Vertical mirroring, -1 when the side input comes from the right.
    pub y_scale: i8,
    /// Slots whose neighbour blends with this tile.
    pub blend_mask: u8,
    /// Blending slots whose neighbour discharges into this tile.
    pub extra_blend_mask: u8,
}

impl TilingDescriptor {
    /// A conduit with no side inputs.
    pub const STRAIGHT: Self = Self {
        shape: 0,
        x_scale: 1,
        y_scale: 1,
        blend_mask: 0,
        extra_blend_mask: 0,
    };

    /// Number of blending neighbours.
    #[must_use]
    pub const fn blend_count(self) -> u32 {
        self.blend_mask.count_ones()
    }

    /// Whether slot `slot` blends.
    #[must_use]
    pub const fn blends(self, slot: u8) -> bool {
        self.blend_mask & (1 << slot) != 0
    }

    /// Whether the neighbour in slot `slot` blends and discharges into this tile.
    #[must_use]
    pub const fn extra_blends(self, slot: u8) -> bool {
        self.extra_blend_mask & (1 << slot) != 0
    }
}

impl Default for TilingDescriptor {
    fn default() -> Self {
        Self::STRAIGHT
    }
}

/// Everything a proximity update caches on a conduit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProximityState {
    /// Derived shape.
    pub tiling: TilingDescriptor,
    /// Nothing liquid-capable of this team ahead.
    pub front_capped: bool,
    /// Straight, with nothing liquid-capable of this team behind.
    pub back_capped: bool,
}

/// Direction of neighbour slot `slot` for a tile facing `rotation`.
#[must_use]
pub fn slot_direction(rotation: Direction, slot: u8) -> Direction {
    rotation.rotated(-i32::from(slot))
}

/// A neighbour as far as blending is concerned, committed or planned.
#[derive(Debug, Clone, Copy)]
struct Neighbor<'a> {
    pos: TilePos,
    block: &'a Block,
    rotation: Direction,
    team: TeamId,
}

/// Whether the tile at `pos` facing `rotation` points at `other`.
const fn looking_at(pos: TilePos, rotation: Direction, other: TilePos) -> bool {
    let ahead = pos.relative(rotation);
    ahead.x == other.x && ahead.y == other.y
}

fn looking_at_either(pos: TilePos, rotation: Direction, other: &Neighbor<'_>) -> bool {
    looking_at(pos, rotation, other.pos)
        || !other.block.rotated_output()
        || looking_at(other.pos, other.rotation, pos)
}

/// Whether `other` pushes its output into the tile at `pos`.
fn discharges_into(other: &Neighbor<'_>, pos: TilePos) -> bool {
    other.block.rotated_output() && looking_at(other.pos, other.rotation, pos)
}

fn blends_with(pos: TilePos, rotation: Direction, team: TeamId, other: &Neighbor<'_>) -> bool {
    other.team == team
        && other.block.has_liquids()
        && (other.block.outputs_liquid() || looking_at(pos, rotation, other.pos))
        && looking_at_either(pos, rotation, other)
}

/// Resolves the committed building on a tile. A building whose block id is
/// not registered is treated as absent.
fn committed_neighbor(world: &World, pos: TilePos) -> Option<Neighbor<'_>> {
    let building = world.building_at(pos)?;
    let Some(block) = world.block(building.block()) else {
        log::warn!(
            "Building at {pos} refers to unknown block {:?}, treating it as absent",
            building.block()
        );
        return None;
    };
    Some(Neighbor {
        pos,
        block,
        rotation: building.rotation(),
        team: building.team(),
    })
}

fn plan_neighbor<'a>(world: &'a World, plan: &BuildPlan, team: TeamId) -> Option<Neighbor<'a>> {
    let block = world.block(plan.block)?;
    Some(Neighbor {
        pos: plan.pos,
        block,
        rotation: if block.rotates() {
            plan.rotation
        } else {
            Direction::East
        },
        team,
    })
}

fn shape_of(right: bool, back: bool, left: bool) -> (u8, i8) {
    match (right, back, left) {
        (true, true, true) => (3, 1),
        (true, _, true) => (4, 1),
        (true, true, false) => (2, 1),
        (false, true, true) => (2, -1),
        (true, false, false) => (1, -1),
        (false, false, true) => (1, 1),
        _ => (0, 1),
    }
}

/// Derives the tiling of a conduit at `pos` facing `rotation`.
///
/// `directional` holds planned neighbours indexed by [`Direction`]; a plan
/// that blends takes precedence over the committed building in that
/// direction. Without plans only committed buildings are consulted.
#[must_use]
pub fn classify(
    world: &World,
    pos: TilePos,
    rotation: Direction,
    team: TeamId,
    directional: Option<&[Option<&BuildPlan>; 4]>,
) -> TilingDescriptor {
    let mut blend_mask = 0u8;
    let mut extra_blend_mask = 0u8;

    for slot in 0..4u8 {
        let direction = slot_direction(rotation, slot);
        let planned = directional
            .and_then(|plans| plans[usize::from(direction.rotation())])
            .and_then(|plan| plan_neighbor(world, plan, team))
            .filter(|neighbor| blends_with(pos, rotation, team, neighbor));
        let neighbor = planned.or_else(|| {
            committed_neighbor(world, pos.relative(direction))
                .filter(|neighbor| blends_with(pos, rotation, team, neighbor))
        });

        if let Some(neighbor) = neighbor {
            blend_mask |= 1 << slot;
            if discharges_into(&neighbor, pos) {
                extra_blend_mask |= 1 << slot;
            }
        }
    }

    let bit = |slot: u8| blend_mask & (1 << slot) != 0;
    let (shape, y_scale) = shape_of(bit(1), bit(2), bit(3));
    TilingDescriptor {
        shape,
        x_scale: 1,
        y_scale,
        blend_mask,
        extra_blend_mask,
    }
}

/// Whether the committed building at `pos` cannot carry liquid for `team`.
fn capped(world: &World, pos: TilePos, team: TeamId) -> bool {
    committed_neighbor(world, pos)
        .is_none_or(|neighbor| neighbor.team != team || !neighbor.block.has_liquids())
}

/// Recomputes the cached proximity state of the conduit at `pos`.
///
/// Returns `None` when the tile holds no conduit.
#[must_use]
pub fn conduit_proximity(world: &World, pos: TilePos) -> Option<ProximityState> {
    let conduit = world.conduit_at(pos)?;
    let rotation = conduit.rotation();
    let team = conduit.team();
    if world.block(conduit.block()).is_none() {
        log::warn!("Conduit at {pos} refers to an unknown block, keeping its tiling");
        return None;
    }

    let tiling = classify(world, pos, rotation, team, None);
    let front_capped = capped(world, pos.relative(rotation), team);
    let back_capped = tiling.shape == 0 && capped(world, pos.relative(rotation.opposite()), team);
    Some(ProximityState {
        tiling,
        front_capped,
        back_capped,
    })
}

/// Previews the tiling of a planned conduit against the rest of its batch.
///
/// Non-breaking plans of the batch adjacent to `plan` act as neighbours;
/// directions without a plan fall back to committed buildings. Plans for
/// blocks that are not conduits keep the straight tiling.
#[must_use]
pub fn plan_tiling(world: &World, plan: &BuildPlan, batch: &[BuildPlan], team: TeamId) -> TilingDescriptor {
    if !world.block(plan.block).is_some_and(Block::is_conduit) {
        return TilingDescriptor::STRAIGHT;
    }

    let mut directional: [Option<&BuildPlan>; 4] = [None; 4];
    for other in batch.iter().filter(|other| !other.breaking) {
        if let Some(direction) = plan.pos.relative_to(other.pos) {
            directional[usize::from(direction.rotation())] = Some(other);
        }
    }
    classify(world, plan.pos, plan.rotation, team, Some(&directional))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use conflux_registry::{BlockId, Registry};

    use super::*;

    struct Fixture {
        world: World,
        conduit: BlockId,
        tank: BlockId,
        wall: BlockId,
    }

    fn fixture() -> Fixture {
        let mut registry = Registry::with_vanilla();
        registry.freeze();
        let id = |name: &str| registry.blocks.get_by_name(name).expect("vanilla block");
        let (conduit, tank, wall) = (id("conduit"), id("liquid-tank"), id("copper-wall"));
        Fixture {
            world: World::new(Arc::new(registry), 8, 8),
            conduit,
            tank,
            wall,
        }
    }

    fn place(fixture: &mut Fixture, x: i32, y: i32, block: BlockId, rotation: Direction, team: TeamId) {
        fixture
            .world
            .place(TilePos::new(x, y), block, rotation, team)
            .expect("place");
    }

    fn tiling_at(world: &World, x: i32, y: i32) -> TilingDescriptor {
        world.conduit_at(TilePos::new(x, y)).expect("conduit").tiling()
    }

    #[test]
    fn test_isolated_conduit_is_capped() {
        let mut fixture = fixture();
        let conduit = fixture.conduit;
        place(&mut fixture, 3, 3, conduit, Direction::East, TeamId::SHARDED);
        let placed = fixture.world.conduit_at(TilePos::new(3, 3)).expect("conduit");
        assert!(placed.front_capped());
        assert!(placed.back_capped());
        assert_eq!(placed.tiling(), TilingDescriptor::STRAIGHT);
    }

    #[test]
    fn test_front_neighbor_uncaps() {
        let mut fixture = fixture();
        let conduit = fixture.conduit;
        place(&mut fixture, 3, 3, conduit, Direction::East, TeamId::SHARDED);
        place(&mut fixture, 4, 3, conduit, Direction::East, TeamId::SHARDED);

        let upstream = fixture.world.conduit_at(TilePos::new(3, 3)).expect("conduit");
        assert!(!upstream.front_capped());
        assert!(upstream.back_capped());
        // The tile ahead faces away, so it blends without feeding back.
        assert!(upstream.tiling().blends(0));
        assert!(!upstream.tiling().extra_blends(0));

        let downstream = fixture.world.conduit_at(TilePos::new(4, 3)).expect("conduit");
        assert!(downstream.front_capped());
        assert!(!downstream.back_capped());
        assert_eq!(downstream.tiling().shape, 0);
        assert!(downstream.tiling().blends(2));
        assert!(downstream.tiling().extra_blends(2));
    }

    #[test]
    fn test_wall_ahead_caps() {
        let mut fixture = fixture();
        let (conduit, wall) = (fixture.conduit, fixture.wall);
        place(&mut fixture, 3, 3, conduit, Direction::East, TeamId::SHARDED);
        place(&mut fixture, 4, 3, wall, Direction::East, TeamId::SHARDED);
        assert!(fixture.world.conduit_at(TilePos::new(3, 3)).expect("conduit").front_capped());
    }

    #[test]
    fn test_side_input_from_right() {
        let mut fixture = fixture();
        let conduit = fixture.conduit;
        place(&mut fixture, 3, 3, conduit, Direction::East, TeamId::SHARDED);
        // South of an east-facing tile is its right.
        place(&mut fixture, 3, 2, conduit, Direction::North, TeamId::SHARDED);

        let tiling = tiling_at(&fixture.world, 3, 3);
        assert_eq!(tiling.shape, 1);
        assert_eq!(tiling.y_scale, -1);
        assert_eq!(tiling.blend_mask, 0b0010);
        assert_eq!(tiling.extra_blend_mask, 0b0010);
    }

    #[test]
    fn test_feeding_neighbor_of_another_type_gets_stub() {
        let mut fixture = fixture();
        let conduit = fixture.conduit;
        let pulse = fixture
            .world
            .registry()
            .blocks
            .get_by_name("pulse-conduit")
            .expect("vanilla block");
        place(&mut fixture, 3, 3, conduit, Direction::East, TeamId::SHARDED);
        place(&mut fixture, 4, 3, conduit, Direction::East, TeamId::SHARDED);
        place(&mut fixture, 3, 2, pulse, Direction::North, TeamId::SHARDED);

        let tiling = tiling_at(&fixture.world, 3, 3);
        assert_eq!(tiling.blend_mask, 0b0011);
        assert_eq!(tiling.extra_blend_mask, 0b0010);
    }

    #[test]
    fn test_shapes_from_side_inputs() {
        let mut fixture = fixture();
        let conduit = fixture.conduit;
        place(&mut fixture, 3, 3, conduit, Direction::East, TeamId::SHARDED);
        place(&mut fixture, 3, 4, conduit, Direction::South, TeamId::SHARDED);
        let left_only = tiling_at(&fixture.world, 3, 3);
        assert_eq!((left_only.shape, left_only.y_scale), (1, 1));

        place(&mut fixture, 3, 2, conduit, Direction::North, TeamId::SHARDED);
        assert_eq!(tiling_at(&fixture.world, 3, 3).shape, 4);

        place(&mut fixture, 2, 3, conduit, Direction::East, TeamId::SHARDED);
        assert_eq!(tiling_at(&fixture.world, 3, 3).shape, 3);
        assert_eq!(tiling_at(&fixture.world, 3, 3).blend_count(), 3);
    }

    #[test]
    fn test_corner_mirroring() {
        let mut fixture = fixture();
        let conduit = fixture.conduit;
        place(&mut fixture, 3, 3, conduit, Direction::East, TeamId::SHARDED);
        place(&mut fixture, 2, 3, conduit, Direction::East, TeamId::SHARDED);
        place(&mut fixture, 3, 4, conduit, Direction::South, TeamId::SHARDED);
        let tiling = tiling_at(&fixture.world, 3, 3);
        assert_eq!((tiling.shape, tiling.y_scale), (2, -1));
    }

    #[test]
    fn test_side_neighbor_facing_away_does_not_blend() {
        let mut fixture = fixture();
        let conduit = fixture.conduit;
        place(&mut fixture, 3, 3, conduit, Direction::East, TeamId::SHARDED);
        place(&mut fixture, 3, 2, conduit, Direction::South, TeamId::SHARDED);
        assert_eq!(tiling_at(&fixture.world, 3, 3), TilingDescriptor::STRAIGHT);
    }

    #[test]
    fn test_tank_blends_without_extra_stub() {
        let mut fixture = fixture();
        let (conduit, tank) = (fixture.conduit, fixture.tank);
        place(&mut fixture, 3, 3, conduit, Direction::East, TeamId::SHARDED);
        place(&mut fixture, 3, 4, tank, Direction::East, TeamId::SHARDED);
        let tiling = tiling_at(&fixture.world, 3, 3);
        assert_eq!(tiling.shape, 1);
        assert_eq!(tiling.extra_blend_mask, 0);
    }

    #[test]
    fn test_team_mismatch_breaks_blend() {
        let mut fixture = fixture();
        let conduit = fixture.conduit;
        place(&mut fixture, 3, 3, conduit, Direction::East, TeamId::SHARDED);
        place(&mut fixture, 3, 2, conduit, Direction::North, TeamId(2));
        place(&mut fixture, 4, 3, conduit, Direction::East, TeamId(2));

        let placed = fixture.world.conduit_at(TilePos::new(3, 3)).expect("conduit");
        assert_eq!(placed.tiling(), TilingDescriptor::STRAIGHT);
        assert!(placed.front_capped());
    }

    #[test]
    fn test_classification_is_idempotent_and_order_independent() {
        let layout = [
            (3, 3, Direction::East),
            (2, 3, Direction::East),
            (3, 2, Direction::North),
            (3, 4, Direction::South),
            (4, 3, Direction::East),
        ];

        let mut forward = fixture();
        let conduit = forward.conduit;
        for (x, y, rotation) in layout {
            place(&mut forward, x, y, conduit, rotation, TeamId::SHARDED);
        }
        let mut backward = fixture();
        for (x, y, rotation) in layout.into_iter().rev() {
            place(&mut backward, x, y, conduit, rotation, TeamId::SHARDED);
        }

        for (x, y, _) in layout {
            let pos = TilePos::new(x, y);
            let first = conduit_proximity(&forward.world, pos).expect("conduit");
            let second = conduit_proximity(&forward.world, pos).expect("conduit");
            assert_eq!(first, second);
            assert_eq!(first.tiling, tiling_at(&forward.world, x, y));
            assert_eq!(tiling_at(&forward.world, x, y), tiling_at(&backward.world, x, y));
        }
    }

    #[test]
    fn test_removal_refreshes_neighbors() {
        let mut fixture = fixture();
        let conduit = fixture.conduit;
        place(&mut fixture, 3, 3, conduit, Direction::East, TeamId::SHARDED);
        place(&mut fixture, 3, 2, conduit, Direction::North, TeamId::SHARDED);
        assert_eq!(tiling_at(&fixture.world, 3, 3).shape, 1);
        fixture.world.remove(TilePos::new(3, 2)).expect("remove");
        assert_eq!(tiling_at(&fixture.world, 3, 3), TilingDescriptor::STRAIGHT);
    }

    #[test]
    fn test_plan_preview_uses_batch() {
        let fixture = fixture();
        let conduit = fixture.conduit;
        let plan = BuildPlan::new(TilePos::new(3, 3), Direction::East, conduit);
        let batch = [
            plan,
            BuildPlan::new(TilePos::new(3, 4), Direction::South, conduit),
            BuildPlan::new(TilePos::new(3, 2), Direction::North, conduit),
        ];
        let tiling = plan_tiling(&fixture.world, &plan, &batch, TeamId::SHARDED);
        assert_eq!(tiling.shape, 4);
        assert_eq!(tiling.extra_blend_mask, 0b1010);

        let ahead = [plan, BuildPlan::new(TilePos::new(4, 3), Direction::East, conduit)];
        let tiling = plan_tiling(&fixture.world, &plan, &ahead, TeamId::SHARDED);
        assert_eq!(tiling.blend_mask, 0b0001);
        assert_eq!(tiling.extra_blend_mask, 0);
    }
}
