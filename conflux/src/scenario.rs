//! Scenario layouts: the grid, its fixed buildings, drag lines and liquid sources.
//!
//! Drag lines go through the same planning path a player would use, so a
//! layout exercises bridging and junction replacement before it runs.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use conflux_core::autotile::plan_tiling;
use conflux_core::placement::{handle_placement_line, resolve_batch};
use conflux_core::{BuildPlan, World, WorldError};
use conflux_registry::{BlockId, LiquidId, Registry};
use conflux_utils::{Direction, TeamId, TilePos};
use serde::Deserialize;
use thiserror::Error;

const DEMO_SCENARIO: &str = include_str!("../../package-content/demo_scenario.json5");

/// Failure to load or build a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The layout file could not be read.
    #[error("scenario file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The layout is not valid JSON5 for this schema.
    #[error("scenario file is malformed: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A block name is not registered.
    #[error("unknown block `{0}`")]
    UnknownBlock(String),
    /// A liquid name is not registered.
    #[error("unknown liquid `{0}`")]
    UnknownLiquid(String),
    /// A drag line is neither horizontal nor vertical.
    #[error("line from {from} to {to} is not straight")]
    NotStraight {
        /// First tile.
        from: TilePos,
        /// Last tile.
        to: TilePos,
    },
    /// The world refused a placement.
    #[error(transparent)]
    World(#[from] WorldError),
}

const fn default_rotation() -> Direction {
    Direction::East
}

/// A single building placed as is.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildingSpec {
    /// Block name.
    pub block: String,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Facing direction.
    #[serde(default = "default_rotation")]
    pub rotation: Direction,
}

/// A straight drag line of one block.
#[derive(Debug, Clone, Deserialize)]
pub struct LineSpec {
    /// Block name.
    pub block: String,
    /// Rotation of every plan on the line.
    pub rotation: Direction,
    /// First tile.
    pub from: TilePos,
    /// Last tile, inclusive.
    pub to: TilePos,
}

/// A pump feeding liquid into a tile every tick.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSpec {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Liquid name.
    pub liquid: String,
    /// Amount offered per tick.
    pub rate: f32,
}

/// A resolved pump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidSource {
    /// Fed tile.
    pub pos: TilePos,
    /// Liquid fed.
    pub liquid: LiquidId,
    /// Amount offered per tick.
    pub rate: f32,
}

/// A scenario layout as written on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioLayout {
    /// Grid width.
    pub width: u32,
    /// Grid height.
    pub height: u32,
    /// Team owning everything in the layout.
    #[serde(default = "default_team")]
    pub team: TeamId,
    /// Buildings placed before any line.
    #[serde(default)]
    pub buildings: Vec<BuildingSpec>,
    /// Drag lines, planned together as one batch.
    #[serde(default)]
    pub lines: Vec<LineSpec>,
    /// Pumps.
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
}

const fn default_team() -> TeamId {
    TeamId::SHARDED
}

impl ScenarioLayout {
    /// Reads a layout file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json5::from_str(&text)?)
    }

    /// The built-in demo layout.
    pub fn demo() -> Result<Self, ScenarioError> {
        Ok(serde_json5::from_str(DEMO_SCENARIO)?)
    }

    /// Builds the world: places buildings, plans and commits the lines, and
    /// resolves the liquid sources.
    pub fn build(&self, registry: Arc<Registry>) -> Result<(World, Vec<LiquidSource>), ScenarioError> {
        let block = |name: &str| {
            registry
                .blocks
                .get_by_name(name)
                .ok_or_else(|| ScenarioError::UnknownBlock(name.to_owned()))
        };
        let mut world = World::new(Arc::clone(&registry), self.width, self.height);

        for building in &self.buildings {
            world.place(
                TilePos::new(building.x, building.y),
                block(&building.block)?,
                building.rotation,
                self.team,
            )?;
        }

        let mut batch = Vec::new();
        let mut bridges = 0;
        for line in &self.lines {
            let mut plans = line_plans(line, block(&line.block)?)?;
            bridges += handle_placement_line(&world, &mut plans).len();
            batch.extend(plans);
        }
        let resolved = resolve_batch(&world, &mut batch);
        let junctions = batch
            .iter()
            .zip(&resolved)
            .filter(|(plan, block)| world.block(**block).is_some_and(|b| b.is_junction()) && !plan.breaking)
            .count();
        let bends = batch
            .iter()
            .filter(|plan| !plan.breaking && plan_tiling(&world, plan, &batch, self.team).shape != 0)
            .count();
        let refused = world.commit_plans(&batch, self.team)?;
        log::info!(
            "Built {}x{} scenario: {} plans, {bridges} bridges, {junctions} junction plans, {bends} bends",
            world.width(),
            world.height(),
            batch.len()
        );
        if refused > 0 {
            log::warn!("{refused} plans were refused by occupied tiles");
        }

        let sources = self
            .sources
            .iter()
            .map(|source| {
                let liquid = registry
                    .liquids
                    .get_by_name(&source.liquid)
                    .ok_or_else(|| ScenarioError::UnknownLiquid(source.liquid.clone()))?;
                Ok(LiquidSource {
                    pos: TilePos::new(source.x, source.y),
                    liquid,
                    rate: source.rate,
                })
            })
            .collect::<Result<Vec<_>, ScenarioError>>()?;

        Ok((world, sources))
    }
}

fn line_plans(line: &LineSpec, block: BlockId) -> Result<Vec<BuildPlan>, ScenarioError> {
    let mut plans = vec![BuildPlan::new(line.from, line.rotation, block)];
    if line.from == line.to {
        return Ok(plans);
    }
    let step = line
        .from
        .absolute_relative_to(line.to)
        .ok_or(ScenarioError::NotStraight {
            from: line.from,
            to: line.to,
        })?;
    let mut pos = line.from;
    while pos != line.to {
        pos = pos.relative(step);
        plans.push(BuildPlan::new(pos, line.rotation, block));
    }
    Ok(plans)
}
