//! Render snapshot of a conduit.
//!
//! Nothing here draws. A renderer reads [`ConduitRenderState`] and applies
//! it inside its own scoped transform, so mirroring one tile never leaks
//! into the next.

use conflux_registry::{Color, LiquidId, LiquidRegistry};
use conflux_utils::Direction;
use smallvec::SmallVec;

use crate::autotile::slot_direction;
use crate::building::{Building, ConduitBuilding};

/// Frames of the liquid surface animation.
pub const ANIMATION_FRAMES: u32 = 50;
/// Ticks one liquid animation cycle takes.
pub const LIQUID_ANIMATION_SCALE: f32 = 230.0;
/// Ticks one gas animation cycle takes.
pub const GAS_ANIMATION_SCALE: f32 = 190.0;
/// Distance of a feeding stub from the tile centre, in tiles.
pub const STUB_OFFSET: f32 = 0.75;

/// Smoothed fill below which no liquid is drawn.
const VISIBLE_FILL: f32 = 0.001;

/// Which half of the sprite a stub uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceMode {
    /// Upper half, for the stub ahead of the tile.
    Top,
    /// Lower half, for stubs beside and behind the tile.
    Bottom,
}

/// A partial conduit sprite drawn beneath a tile toward a neighbour feeding into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StubDraw {
    /// Direction of the neighbour the stub points at.
    pub direction: Direction,
    /// Rotation to draw the sprite with.
    pub rotation: Direction,
    /// Offset from the tile centre, in tiles.
    pub offset: (f32, f32),
    /// Sprite half.
    pub slice: SliceMode,
}

/// Liquid sprite variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidRegion {
    /// Side-input shape; index into the rotated liquid regions.
    Rotated(u8),
    /// Full-tile liquid frame.
    Full,
}

/// Liquid layer of a conduit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidRender {
    /// Liquid drawn.
    pub liquid: LiquidId,
    /// Tint.
    pub color: Color,
    /// Gases use their own frames.
    pub gas: bool,
    /// Opacity, the smoothed fill.
    pub alpha: f32,
    /// Sprite variant.
    pub region: LiquidRegion,
    /// Animation frame in `0..ANIMATION_FRAMES`.
    pub frame: u32,
}

/// Everything needed to draw one conduit tile.
#[derive(Debug, Clone, PartialEq)]
pub struct ConduitRenderState {
    /// Shape index.
    pub shape: u8,
    /// Horizontal mirroring.
    pub x_scale: i8,
    /// Vertical mirroring.
    pub y_scale: i8,
    /// Facing direction.
    pub rotation: Direction,
    /// Slots whose neighbour discharges into this tile.
    pub extra_blend_mask: u8,
    /// Smoothed fill ratio in `[0, 1]`.
    pub fill: f32,
    /// Draw the cap ahead.
    pub front_capped: bool,
    /// Draw the cap behind.
    pub back_capped: bool,
    /// Stubs drawn beneath the tile.
    pub stubs: SmallVec<[StubDraw; 4]>,
    /// Liquid layer, absent while the conduit looks empty.
    pub liquid: Option<LiquidRender>,
}

/// Frame of the liquid animation at `time` ticks.
///
/// Each liquid is phase shifted by its id so neighbouring liquids do not
/// pulse in sync.
#[must_use]
pub fn animation_frame(time: f32, liquid: LiquidId, gas: bool) -> u32 {
    let scale = if gas {
        GAS_ANIMATION_SCALE
    } else {
        LIQUID_ANIMATION_SCALE
    };
    let phase = (time.max(0.0) / scale * ANIMATION_FRAMES as f32) as u32;
    phase.wrapping_add(u32::from(liquid.0) * 5) % ANIMATION_FRAMES
}

impl ConduitBuilding {
    /// Merge stubs toward the neighbours feeding into this conduit.
    #[must_use]
    pub fn stubs(&self) -> SmallVec<[StubDraw; 4]> {
        let rotation = self.rotation();
        let tiling = self.tiling();
        (0..4u8)
            .filter(|slot| tiling.extra_blends(*slot))
            .map(|slot| {
                let direction = slot_direction(rotation, slot);
                let (dx, dy) = direction.offset();
                let offset = (dx as f32 * STUB_OFFSET, dy as f32 * STUB_OFFSET);
                StubDraw {
                    direction,
                    rotation: if slot == 0 { rotation } else { direction },
                    offset,
                    slice: if slot == 0 {
                        SliceMode::Top
                    } else {
                        SliceMode::Bottom
                    },
                }
            })
            .collect()
    }

    /// Snapshot for the renderer at animation time `time`.
    #[must_use]
    pub fn render_state(&self, liquids: &LiquidRegistry, time: f32) -> ConduitRenderState {
        let tiling = self.tiling();
        let fill = self.smoothed_fill();
        let liquid = self
            .liquid_container()
            .current()
            .filter(|_| fill > VISIBLE_FILL)
            .and_then(|id| liquids.get(id).map(|entry| (id, entry)))
            .map(|(id, entry)| {
                let region = if tiling.shape == 1 {
                    let offset = if tiling.y_scale == -1 { 3 } else { 0 };
                    LiquidRegion::Rotated((self.rotation().rotation() + offset) % 4)
                } else {
                    LiquidRegion::Full
                };
                LiquidRender {
                    liquid: id,
                    color: entry.color,
                    gas: entry.gas,
                    alpha: fill,
                    region,
                    frame: animation_frame(time, id, entry.gas),
                }
            });

        ConduitRenderState {
            shape: tiling.shape,
            x_scale: tiling.x_scale,
            y_scale: tiling.y_scale,
            rotation: self.rotation(),
            extra_blend_mask: tiling.extra_blend_mask,
            fill,
            front_capped: self.front_capped(),
            back_capped: self.back_capped(),
            stubs: self.stubs(),
            liquid,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use conflux_registry::Registry;
    use conflux_utils::{TeamId, TilePos};

    use super::*;
    use crate::world::World;

    fn world() -> World {
        let mut registry = Registry::with_vanilla();
        registry.freeze();
        World::new(Arc::new(registry), 8, 8)
    }

    #[test]
    fn test_side_input_stub_and_region() {
        let mut world = world();
        let conduit = world.registry().blocks.get_by_name("conduit").expect("conduit");
        let water = world.registry().liquids.get_by_name("water").expect("water");
        world
            .place(TilePos::new(3, 3), conduit, Direction::North, TeamId::SHARDED)
            .expect("place");
        // East of a north-facing tile is its right.
        world
            .place(TilePos::new(4, 3), conduit, Direction::West, TeamId::SHARDED)
            .expect("place");
        world.inject(TilePos::new(3, 3), water, 10.0);
        for _ in 0..120 {
            if let Some(conduit) = world.conduit_at_mut(TilePos::new(3, 3)) {
                conduit.update_smoothing(0.05, 1.0);
            }
        }

        let target = world.conduit_at(TilePos::new(3, 3)).expect("conduit");
        let state = target.render_state(&world.registry().liquids, 0.0);
        assert_eq!((state.shape, state.y_scale), (1, -1));
        assert_eq!(state.stubs.len(), 1);
        let stub = state.stubs[0];
        assert_eq!(stub.direction, Direction::East);
        assert_eq!(stub.rotation, Direction::East);
        assert_eq!(stub.slice, SliceMode::Bottom);
        assert!((stub.offset.0 - 0.75).abs() < f32::EPSILON);

        let liquid = state.liquid.expect("visible liquid");
        assert_eq!(liquid.liquid, water);
        assert_eq!(liquid.region, LiquidRegion::Rotated(0));
        assert!(!liquid.gas);
    }

    #[test]
    fn test_empty_conduit_draws_no_liquid() {
        let mut world = world();
        let conduit = world.registry().blocks.get_by_name("conduit").expect("conduit");
        world
            .place(TilePos::new(1, 1), conduit, Direction::East, TeamId::SHARDED)
            .expect("place");
        let state = world
            .conduit_at(TilePos::new(1, 1))
            .expect("conduit")
            .render_state(&world.registry().liquids, 10.0);
        assert!(state.liquid.is_none());
        assert!(state.stubs.is_empty());
        assert!(state.front_capped && state.back_capped);
    }

    #[test]
    fn test_animation_frame_wraps() {
        let water = LiquidId(0);
        assert_eq!(animation_frame(0.0, water, false), 0);
        assert_eq!(animation_frame(LIQUID_ANIMATION_SCALE, water, false), 0);
        assert!(animation_frame(1.0e6, LiquidId(3), true) < ANIMATION_FRAMES);
    }
}
