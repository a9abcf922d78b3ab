//! Tile grid and the per-tick scheduler.
//!
//! The world owns one optional building per tile. Neighbours are never
//! linked; everything that needs an adjacent building looks it up by
//! coordinate arithmetic, so removing a building cannot leave a dangling
//! link behind.

use std::collections::BTreeSet;
use std::sync::Arc;

use conflux_registry::{Block, BlockId, LiquidId, Registry};
use conflux_utils::{Direction, TeamId, TilePos};
use thiserror::Error;

use crate::autotile;
use crate::building::{Building, ConduitBuilding, ConduitSave, new_building};
use crate::flow::{self, FlowOutcome};
use crate::liquid_container::LiquidContainer;
use crate::placement::BuildPlan;

/// Failure to change the grid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    /// The position lies outside the grid.
    #[error("tile {0} is out of bounds")]
    OutOfBounds(TilePos),
    /// Another building already occupies the tile.
    #[error("tile {0} is already occupied")]
    Occupied(TilePos),
    /// The tile has no building to remove.
    #[error("tile {0} is empty")]
    Empty(TilePos),
    /// The block id is not registered.
    #[error("unknown block {0:?}")]
    UnknownBlock(BlockId),
    /// The block is not a conduit.
    #[error("block {0:?} is not a conduit")]
    NotAConduit(BlockId),
}

/// Counters of one scheduler pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickStats {
    /// Conduits whose update ran.
    pub updated: usize,
    /// Idle conduits the scheduler skipped.
    pub skipped: usize,
    /// Total liquid moved between conduits.
    pub moved: f32,
    /// Total liquid discarded by leaking conduits.
    pub leaked: f32,
}

/// A rectangular tile grid.
pub struct World {
    registry: Arc<Registry>,
    width: i32,
    height: i32,
    tiles: Vec<Option<Box<dyn Building>>>,
    /// Conduit positions in a stable update order.
    ticking: BTreeSet<TilePos>,
    tick_count: u64,
}

impl World {
    /// Creates an empty grid of `width` x `height` tiles.
    #[must_use]
    pub fn new(registry: Arc<Registry>, width: u32, height: u32) -> Self {
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        let size = width as usize * height as usize;
        let mut tiles = Vec::with_capacity(size);
        tiles.resize_with(size, || None);
        Self {
            registry,
            width,
            height,
            tiles,
            ticking: BTreeSet::new(),
            tick_count: 0,
        }
    }

    /// Content registries shared with every building.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Looks a block type up by id.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.registry.blocks.get(id)
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Number of completed ticks.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Whether `pos` is a tile of this grid.
    #[must_use]
    pub const fn tile_in_bounds(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: TilePos) -> Option<usize> {
        self.tile_in_bounds(pos)
            .then(|| pos.y as usize * self.width as usize + pos.x as usize)
    }

    /// The committed building on a tile.
    #[must_use]
    pub fn building_at(&self, pos: TilePos) -> Option<&dyn Building> {
        let index = self.index(pos)?;
        self.tiles[index].as_deref()
    }

    /// Mutable access to the committed building on a tile.
    pub fn building_at_mut(&mut self, pos: TilePos) -> Option<&mut (dyn Building + 'static)> {
        let index = self.index(pos)?;
        self.tiles[index].as_deref_mut()
    }

    /// The conduit on a tile, if that tile holds one.
    #[must_use]
    pub fn conduit_at(&self, pos: TilePos) -> Option<&ConduitBuilding> {
        self.building_at(pos).and_then(Building::as_conduit)
    }

    /// Mutable access to the conduit on a tile.
    pub fn conduit_at_mut(&mut self, pos: TilePos) -> Option<&mut ConduitBuilding> {
        self.building_at_mut(pos).and_then(Building::as_conduit_mut)
    }

    /// Places a building and refreshes the tiling around it.
    pub fn place(
        &mut self,
        pos: TilePos,
        block: BlockId,
        rotation: Direction,
        team: TeamId,
    ) -> Result<(), WorldError> {
        let index = self.index(pos).ok_or(WorldError::OutOfBounds(pos))?;
        if self.tiles[index].is_some() {
            return Err(WorldError::Occupied(pos));
        }
        let block = self
            .registry
            .blocks
            .get(block)
            .ok_or(WorldError::UnknownBlock(block))?;
        let building = new_building(block, pos, rotation, team);
        if building.as_conduit().is_some() {
            self.ticking.insert(pos);
        }
        log::debug!("Placed `{}` at {pos} facing {rotation:?}", block.name);
        self.tiles[index] = Some(building);
        self.on_tile_changed(pos);
        Ok(())
    }

    /// Restores a saved conduit onto an empty tile.
    pub fn load_conduit(
        &mut self,
        pos: TilePos,
        block: BlockId,
        team: TeamId,
        save: ConduitSave,
    ) -> Result<(), WorldError> {
        let index = self.index(pos).ok_or(WorldError::OutOfBounds(pos))?;
        if self.tiles[index].is_some() {
            return Err(WorldError::Occupied(pos));
        }
        let config = self
            .registry
            .blocks
            .get(block)
            .ok_or(WorldError::UnknownBlock(block))?
            .as_conduit()
            .ok_or(WorldError::NotAConduit(block))?;
        let conduit = ConduitBuilding::from_save(block, config, pos, team, save);
        self.tiles[index] = Some(Box::new(conduit));
        self.ticking.insert(pos);
        self.on_tile_changed(pos);
        Ok(())
    }

    /// Removes the building on a tile and refreshes the tiling around it.
    pub fn remove(&mut self, pos: TilePos) -> Result<Box<dyn Building>, WorldError> {
        let index = self.index(pos).ok_or(WorldError::OutOfBounds(pos))?;
        let building = self.tiles[index].take().ok_or(WorldError::Empty(pos))?;
        self.ticking.remove(&pos);
        log::debug!("Removed `{:?}` at {}", building.block(), building.pos());
        self.on_tile_changed(pos);
        Ok(building)
    }

    /// Commits a batch of resolved plans and returns how many were refused.
    ///
    /// Breaking plans clear their tile. A plan over a different block, or over
    /// the same block facing another way, replaces it; a plan matching what is
    /// already there is skipped. Plans touching another team's building, or a
    /// building their block cannot replace, are refused and leave the tile as
    /// it was. Stops at the first plan that fails with an error; earlier plans
    /// stay committed.
    pub fn commit_plans(&mut self, plans: &[BuildPlan], team: TeamId) -> Result<usize, WorldError> {
        let mut refused = 0;
        for plan in plans {
            if let Some(owner) = self
                .building_at(plan.pos)
                .map(|existing| existing.team())
                .filter(|owner| *owner != team)
            {
                log::warn!("Refusing plan at {}: tile belongs to {owner:?}", plan.pos);
                refused += 1;
                continue;
            }

            if plan.breaking {
                if self.building_at(plan.pos).is_some() {
                    self.remove(plan.pos)?;
                }
                continue;
            }

            let block = self
                .registry
                .blocks
                .get(plan.block)
                .ok_or(WorldError::UnknownBlock(plan.block))?;
            let rotation = if block.rotates() {
                plan.rotation
            } else {
                Direction::East
            };
            if let Some(existing) = self.building_at(plan.pos) {
                if existing.block() == plan.block && existing.rotation() == rotation {
                    continue;
                }
                let replaceable = self
                    .block(existing.block())
                    .is_some_and(|current| current.replaceable_by(block));
                if !replaceable {
                    log::warn!(
                        "Refusing plan at {}: `{}` cannot replace the building there",
                        plan.pos,
                        block.name
                    );
                    refused += 1;
                    continue;
                }
                self.remove(plan.pos)?;
            }
            self.place(plan.pos, plan.block, rotation, team)?;
        }
        Ok(refused)
    }

    /// Adds liquid straight into a building, as a pump or test harness would.
    ///
    /// Returns the amount that fit.
    pub fn inject(&mut self, pos: TilePos, liquid: LiquidId, amount: f32) -> f32 {
        match self.building_at_mut(pos) {
            Some(building) => {
                if let Some(conduit) = building.as_conduit_mut() {
                    conduit.handle_liquid(liquid, amount)
                } else {
                    building
                        .liquids_mut()
                        .map_or(0.0, |liquids| liquids.add(liquid, amount))
                }
            }
            None => 0.0,
        }
    }

    /// Sum of `liquid` held by all buildings.
    #[must_use]
    pub fn total_liquid(&self, liquid: LiquidId) -> f32 {
        self.tiles
            .iter()
            .flatten()
            .filter_map(|building| building.liquids())
            .map(|liquids| liquids.get(liquid))
            .sum()
    }

    /// Sum of every liquid held by all buildings.
    #[must_use]
    pub fn total_held(&self) -> f32 {
        self.tiles
            .iter()
            .flatten()
            .filter_map(|building| building.liquids())
            .map(LiquidContainer::amount)
            .sum()
    }

    /// Recomputes the cached tiling of a conduit.
    pub fn update_proximity(&mut self, pos: TilePos) {
        let Some(state) = autotile::conduit_proximity(self, pos) else {
            return;
        };
        if let Some(conduit) = self.conduit_at_mut(pos) {
            conduit.apply_proximity(state);
        }
    }

    fn on_tile_changed(&mut self, pos: TilePos) {
        self.update_proximity(pos);
        for direction in Direction::ALL {
            self.update_proximity(pos.relative(direction));
        }
    }

    /// Runs one scheduler pass over every awake conduit.
    pub fn tick(&mut self, delta: f32) -> TickStats {
        let mut stats = TickStats::default();
        let positions: Vec<TilePos> = self.ticking.iter().copied().collect();

        for pos in positions {
            if self.conduit_at(pos).is_none_or(ConduitBuilding::is_idle) {
                stats.skipped += 1;
                continue;
            }
            stats.updated += 1;
            match flow::update_conduit(self, pos, delta) {
                FlowOutcome::Moved(amount) => stats.moved += amount,
                FlowOutcome::Leaked(amount) => stats.leaked += amount,
                FlowOutcome::Idle
                | FlowOutcome::Waiting
                | FlowOutcome::Blocked
                | FlowOutcome::Rejected => {}
            }
        }

        self.tick_count += 1;
        log::trace!(
            "Tick {} updated {} conduits, skipped {}",
            self.tick_count,
            stats.updated,
            stats.skipped
        );
        stats
    }
}
