//! Conduit building state.

use conflux_registry::{BlockId, ConduitConfig, LiquidId};
use conflux_utils::{Direction, Interval, TeamId, TilePos};
use serde::{Deserialize, Serialize};

use crate::autotile::{ProximityState, TilingDescriptor};
use crate::building::Building;
use crate::liquid_container::LiquidContainer;

/// Per-tile state of a conduit.
///
/// Configuration stays on the block and is looked up through the registry;
/// this struct only holds what differs from tile to tile.
#[derive(Debug, Clone)]
pub struct ConduitBuilding {
    pos: TilePos,
    block: BlockId,
    team: TeamId,
    rotation: Direction,
    liquids: LiquidContainer,
    smoothed_fill: f32,
    tiling: TilingDescriptor,
    front_capped: bool,
    back_capped: bool,
    idle: bool,
    flow_timer: Interval,
}

/// Persisted part of a conduit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConduitSave {
    /// Facing direction.
    pub rotation: Direction,
    /// Contents.
    pub liquids: LiquidContainer,
}

impl ConduitBuilding {
    /// Creates an empty conduit. It starts awake and capped on both ends until
    /// its first proximity update.
    #[must_use]
    pub fn new(
        block: BlockId,
        config: &ConduitConfig,
        pos: TilePos,
        rotation: Direction,
        team: TeamId,
    ) -> Self {
        Self {
            pos,
            block,
            team,
            rotation,
            liquids: LiquidContainer::new(config.settings.capacity),
            smoothed_fill: 0.0,
            tiling: TilingDescriptor::STRAIGHT,
            front_capped: true,
            back_capped: true,
            idle: false,
            flow_timer: Interval::new(),
        }
    }

    /// Rebuilds a conduit from saved state. The render fill restarts at the live ratio.
    #[must_use]
    pub fn from_save(
        block: BlockId,
        config: &ConduitConfig,
        pos: TilePos,
        team: TeamId,
        save: ConduitSave,
    ) -> Self {
        let mut conduit = Self::new(block, config, pos, save.rotation, team);
        conduit.liquids = save.liquids.restore(config.settings.capacity);
        conduit.smoothed_fill = conduit.liquids.fill_ratio();
        conduit
    }

    /// Extracts the persisted fields.
    #[must_use]
    pub const fn save(&self) -> ConduitSave {
        ConduitSave {
            rotation: self.rotation,
            liquids: self.liquids,
        }
    }

    /// Tile this conduit discharges into.
    #[must_use]
    pub const fn next_pos(&self) -> TilePos {
        self.pos.relative(self.rotation)
    }

    /// Tile behind this conduit.
    #[must_use]
    pub const fn back_pos(&self) -> TilePos {
        self.pos.relative(self.rotation.opposite())
    }

    /// Whether this conduit takes `liquid` offered by the building at `source`.
    ///
    /// Always wakes the conduit, whatever the answer. Liquid is taken when it
    /// matches the current one or the conduit is nearly empty, and never from
    /// the tile this conduit discharges into.
    pub fn accept_liquid(&mut self, source: TilePos, liquid: LiquidId, priming_threshold: f32) -> bool {
        self.no_sleep();
        let compatible = self.liquids.current() == Some(liquid)
            || self.liquids.amount() < priming_threshold;
        let from_front = source.relative_to(self.pos) == Some(self.rotation.opposite());
        compatible && !from_front
    }

    /// Stores incoming liquid and returns how much fit.
    pub fn handle_liquid(&mut self, liquid: LiquidId, amount: f32) -> f32 {
        self.no_sleep();
        self.liquids.add(liquid, amount)
    }

    /// Eases the render fill toward the live fill ratio.
    pub fn update_smoothing(&mut self, smoothing: f32, delta: f32) {
        let target = self.liquids.fill_ratio();
        let alpha = 1.0 - (1.0 - smoothing).powf(delta.max(0.0));
        self.smoothed_fill += (target - self.smoothed_fill) * alpha.clamp(0.0, 1.0);
        self.smoothed_fill = self.smoothed_fill.clamp(0.0, 1.0);
    }

    /// Stores the result of a proximity update.
    pub fn apply_proximity(&mut self, state: ProximityState) {
        self.tiling = state.tiling;
        self.front_capped = state.front_capped;
        self.back_capped = state.back_capped;
        self.no_sleep();
    }

    /// Advances the flow timer; true when a flow attempt is due.
    pub fn flow_due(&mut self, interval: f32, delta: f32) -> bool {
        self.flow_timer.get(interval, delta)
    }

    /// Lets the scheduler skip this conduit.
    pub fn sleep(&mut self) {
        self.idle = true;
    }

    /// Makes the scheduler update this conduit again.
    pub fn no_sleep(&mut self) {
        self.idle = false;
    }

    /// Whether the scheduler may skip this conduit.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.idle
    }

    /// Cached tiling descriptor.
    #[must_use]
    pub const fn tiling(&self) -> TilingDescriptor {
        self.tiling
    }

    /// Render-only fill ratio.
    #[must_use]
    pub const fn smoothed_fill(&self) -> f32 {
        self.smoothed_fill
    }

    /// No liquid-capable building of this team ahead.
    #[must_use]
    pub const fn front_capped(&self) -> bool {
        self.front_capped
    }

    /// Straight conduit with no liquid-capable building of this team behind.
    #[must_use]
    pub const fn back_capped(&self) -> bool {
        self.back_capped
    }

    /// Contents.
    #[must_use]
    pub const fn liquid_container(&self) -> &LiquidContainer {
        &self.liquids
    }

    /// Mutable contents.
    pub fn liquid_container_mut(&mut self) -> &mut LiquidContainer {
        &mut self.liquids
    }
}

impl Building for ConduitBuilding {
    fn pos(&self) -> TilePos {
        self.pos
    }

    fn block(&self) -> BlockId {
        self.block
    }

    fn team(&self) -> TeamId {
        self.team
    }

    fn rotation(&self) -> Direction {
        self.rotation
    }

    fn liquids(&self) -> Option<&LiquidContainer> {
        Some(&self.liquids)
    }

    fn liquids_mut(&mut self) -> Option<&mut LiquidContainer> {
        Some(&mut self.liquids)
    }

    fn as_conduit(&self) -> Option<&ConduitBuilding> {
        Some(self)
    }

    fn as_conduit_mut(&mut self) -> Option<&mut ConduitBuilding> {
        Some(self)
    }
}
