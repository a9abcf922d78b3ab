//! Per-tile building state.
//!
//! Every occupied tile owns one boxed [`Building`]. Conduits carry their own
//! state; every other block uses [`BasicBuilding`], which is enough for the
//! conduit logic to query team, rotation and liquid capability.

mod conduit;

pub use conduit::{ConduitBuilding, ConduitSave};

use conflux_registry::{Block, BlockId, BlockKind};
use conflux_utils::{Direction, TeamId, TilePos};

use crate::liquid_container::LiquidContainer;

/// State shared by everything placed on a tile.
pub trait Building: Send + Sync {
    /// Tile this building occupies.
    fn pos(&self) -> TilePos;

    /// Block type of this building.
    fn block(&self) -> BlockId;

    /// Owning team.
    fn team(&self) -> TeamId;

    /// Facing direction. Unrotated blocks report [`Direction::East`].
    fn rotation(&self) -> Direction;

    /// Liquid storage, if the block holds liquid.
    fn liquids(&self) -> Option<&LiquidContainer>;

    /// Mutable liquid storage, if the block holds liquid.
    fn liquids_mut(&mut self) -> Option<&mut LiquidContainer>;

    /// Downcast to a conduit.
    fn as_conduit(&self) -> Option<&ConduitBuilding> {
        None
    }

    /// Mutable downcast to a conduit.
    fn as_conduit_mut(&mut self) -> Option<&mut ConduitBuilding> {
        None
    }
}

/// A building without behaviour of its own: junctions, bridges, tanks, walls.
#[derive(Debug, Clone)]
pub struct BasicBuilding {
    pos: TilePos,
    block: BlockId,
    team: TeamId,
    rotation: Direction,
    liquids: Option<LiquidContainer>,
}

impl BasicBuilding {
    /// Creates a building of `block`.
    #[must_use]
    pub fn new(block: &Block, pos: TilePos, rotation: Direction, team: TeamId) -> Self {
        Self {
            pos,
            block: block.id,
            team,
            rotation,
            liquids: block
                .has_liquids()
                .then(|| LiquidContainer::new(block.liquid_capacity())),
        }
    }
}

impl Building for BasicBuilding {
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
        self.liquids.as_ref()
    }

    fn liquids_mut(&mut self) -> Option<&mut LiquidContainer> {
        self.liquids.as_mut()
    }
}

/// Creates the building for a freshly placed block.
#[must_use]
pub fn new_building(
    block: &Block,
    pos: TilePos,
    rotation: Direction,
    team: TeamId,
) -> Box<dyn Building> {
    let rotation = if block.rotates() {
        rotation
    } else {
        Direction::East
    };
    match &block.kind {
        BlockKind::Conduit(config) => Box::new(ConduitBuilding::new(
            block.id, config, pos, rotation, team,
        )),
        BlockKind::Junction | BlockKind::Bridge { .. } | BlockKind::Tank { .. } | BlockKind::Wall => {
            Box::new(BasicBuilding::new(block, pos, rotation, team))
        }
    }
}
