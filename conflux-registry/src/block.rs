//! Block types.
//!
//! A [`Block`] is the immutable, shared description of everything placed on
//! a tile of that type. Conduits carry a [`ConduitConfig`] whose replacement
//! blocks are resolved to ids when the conduit is registered, so placement
//! never has to inspect block types at runtime.

use std::borrow::Cow;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{ConfigurationError, RegistryExt};

/// Block id, the index of the block in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, Deserialize)]
pub struct BlockId(pub u16);

/// Tunable numbers of a conduit type.
///
/// Rates are expressed per tick at a delta of `1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConduitSettings {
    /// Maximum liquid held by one tile.
    pub capacity: f32,
    /// Discard liquid that has nowhere to go instead of holding it.
    pub leaks: bool,
    /// Upper bound on liquid moved forward per tick.
    pub max_flow: f32,
    /// Multiplier applied to the source fill ratio when computing flow.
    pub liquid_pressure: f32,
    /// Fraction of the gap to the live fill ratio closed each tick by the render fill.
    pub smoothing: f32,
    /// Below this amount a tile may switch to a different liquid.
    pub priming_threshold: f32,
    /// Below this amount a tile is considered empty and goes idle.
    pub sleep_epsilon: f32,
    /// Ticks between two flow attempts.
    pub flow_interval: f32,
}

impl Default for ConduitSettings {
    fn default() -> Self {
        Self {
            capacity: 10.0,
            leaks: true,
            max_flow: 10.0,
            liquid_pressure: 1.0,
            smoothing: 0.05,
            priming_threshold: 0.2,
            sleep_epsilon: 0.001,
            flow_interval: 1.0,
        }
    }
}

impl ConduitSettings {
    fn validate(&self, block: &str) -> Result<(), ConfigurationError> {
        if !self.capacity.is_finite() || self.capacity <= 0.0 {
            return Err(ConfigurationError::InvalidCapacity {
                block: block.to_owned(),
                capacity: self.capacity,
            });
        }
        let invalid = |field, value| ConfigurationError::InvalidValue {
            block: block.to_owned(),
            field,
            value,
        };
        if !self.max_flow.is_finite() || self.max_flow <= 0.0 {
            return Err(invalid("max_flow", self.max_flow));
        }
        if !self.liquid_pressure.is_finite() || self.liquid_pressure <= 0.0 {
            return Err(invalid("liquid_pressure", self.liquid_pressure));
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(invalid("smoothing", self.smoothing));
        }
        if !(self.priming_threshold >= 0.0 && self.priming_threshold < self.capacity) {
            return Err(invalid("priming_threshold", self.priming_threshold));
        }
        if !(self.sleep_epsilon >= 0.0 && self.sleep_epsilon < self.capacity) {
            return Err(invalid("sleep_epsilon", self.sleep_epsilon));
        }
        if !self.flow_interval.is_finite() || self.flow_interval < 0.0 {
            return Err(invalid("flow_interval", self.flow_interval));
        }
        Ok(())
    }
}

/// Bridge variant used when a drag line spans obstacles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeReplacement {
    /// Two-endpoint bridge linked by an explicit offset stored on one end.
    ItemBridge {
        /// Bridge block placed at both ends.
        block: BlockId,
        /// Maximum span in tiles.
        range: u32,
    },
    /// Directional duct bridge; the link follows the rotation of its ends.
    DirectionalDuct {
        /// Bridge block placed at both ends.
        block: BlockId,
        /// Maximum span in tiles.
        range: u32,
    },
}

impl BridgeReplacement {
    /// The bridge block.
    #[must_use]
    pub const fn block(self) -> BlockId {
        match self {
            Self::ItemBridge { block, .. } | Self::DirectionalDuct { block, .. } => block,
        }
    }

    /// Maximum span in tiles.
    #[must_use]
    pub const fn range(self) -> u32 {
        match self {
            Self::ItemBridge { range, .. } | Self::DirectionalDuct { range, .. } => range,
        }
    }
}

/// Liquid held by one junction or bridge building.
pub const PASSTHROUGH_CAPACITY: f32 = 10.0;

/// Resolved conduit configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConduitConfig {
    /// Numeric settings.
    pub settings: ConduitSettings,
    /// Block used where two conduit lines cross.
    pub junction_replacement: Option<BlockId>,
    /// Bridge used for drag lines that span gaps.
    pub bridge_replacement: Option<BridgeReplacement>,
}

/// What a block does.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    /// Directional liquid carrier.
    Conduit(ConduitConfig),
    /// Passes crossing flows straight through.
    Junction,
    /// Connects two tiles across a gap.
    Bridge {
        /// Maximum span in tiles.
        range: u32,
        /// Direction comes from rotation rather than a stored link.
        directional: bool,
    },
    /// Undirected liquid storage.
    Tank {
        /// Maximum liquid held.
        capacity: f32,
    },
    /// Solid obstacle without liquid handling.
    Wall,
}

/// A registered block type.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Registry id.
    pub id: BlockId,
    /// Unique name.
    pub name: Cow<'static, str>,
    /// Behaviour.
    pub kind: BlockKind,
}

impl Block {
    /// Whether buildings of this block hold liquid.
    #[must_use]
    pub const fn has_liquids(&self) -> bool {
        !matches!(self.kind, BlockKind::Wall)
    }

    /// Whether this block pushes liquid into its neighbours.
    #[must_use]
    pub const fn outputs_liquid(&self) -> bool {
        self.has_liquids()
    }

    /// Whether the output direction of this block follows its rotation.
    #[must_use]
    pub const fn rotated_output(&self) -> bool {
        match self.kind {
            BlockKind::Conduit(_) => true,
            BlockKind::Bridge { directional, .. } => directional,
            BlockKind::Junction | BlockKind::Tank { .. } | BlockKind::Wall => false,
        }
    }

    /// Whether the block is placed with a rotation at all.
    #[must_use]
    pub const fn rotates(&self) -> bool {
        self.rotated_output()
    }

    /// Maximum liquid held by one building of this block.
    #[must_use]
    pub const fn liquid_capacity(&self) -> f32 {
        match &self.kind {
            BlockKind::Conduit(config) => config.settings.capacity,
            BlockKind::Tank { capacity } => *capacity,
            BlockKind::Junction | BlockKind::Bridge { .. } => PASSTHROUGH_CAPACITY,
            BlockKind::Wall => 0.0,
        }
    }

    /// Conduit configuration, if this is a conduit.
    #[must_use]
    pub const fn as_conduit(&self) -> Option<&ConduitConfig> {
        match &self.kind {
            BlockKind::Conduit(config) => Some(config),
            _ => None,
        }
    }

    /// Returns true for conduits.
    #[must_use]
    pub const fn is_conduit(&self) -> bool {
        matches!(self.kind, BlockKind::Conduit(_))
    }

    /// Returns true for junctions.
    #[must_use]
    pub const fn is_junction(&self) -> bool {
        matches!(self.kind, BlockKind::Junction)
    }

    const fn is_line_block(&self) -> bool {
        matches!(
            self.kind,
            BlockKind::Conduit(_) | BlockKind::Junction | BlockKind::Bridge { .. }
        )
    }

    /// Whether a plan for `other` may overwrite a building of this block.
    ///
    /// Conduits, junctions and bridges replace one another. Any other block
    /// can only be re-placed as itself, for instance with a new rotation.
    #[must_use]
    pub fn replaceable_by(&self, other: &Self) -> bool {
        self.id == other.id || (self.is_line_block() && other.is_line_block())
    }
}

/// Block behaviour as written in configuration, replacements still by name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKindDefinition {
    /// See [`BlockKind::Conduit`].
    Conduit {
        /// Numeric settings.
        #[serde(flatten)]
        settings: ConduitSettings,
        /// Name of the junction replacement.
        #[serde(default)]
        junction: Option<String>,
        /// Name of the bridge replacement.
        #[serde(default)]
        bridge: Option<String>,
    },
    /// See [`BlockKind::Junction`].
    Junction,
    /// See [`BlockKind::Bridge`].
    Bridge {
        /// Maximum span in tiles.
        range: u32,
        /// Direction comes from rotation.
        #[serde(default)]
        directional: bool,
    },
    /// See [`BlockKind::Tank`].
    Tank {
        /// Maximum liquid held.
        capacity: f32,
    },
    /// See [`BlockKind::Wall`].
    Wall,
}

/// A block as written in configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockDefinition {
    /// Unique name.
    pub name: String,
    /// Behaviour.
    #[serde(flatten)]
    pub kind: BlockKindDefinition,
}

/// Registry of every block type.
///
/// Replacements must be registered before the conduits referring to them.
pub struct BlockRegistry {
    blocks: Vec<Block>,
    by_name: FxHashMap<Cow<'static, str>, BlockId>,
    allows_registering: bool,
}

impl BlockRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            by_name: FxHashMap::default(),
            allows_registering: true,
        }
    }

    /// Validates a definition, resolves its replacements and registers it.
    pub fn register(&mut self, definition: BlockDefinition) -> Result<BlockId, ConfigurationError> {
        let BlockDefinition { name, kind } = definition;
        if !self.allows_registering {
            return Err(ConfigurationError::Frozen(name));
        }
        if self.by_name.contains_key(name.as_str()) {
            return Err(ConfigurationError::Duplicate(name));
        }

        let id = BlockId(u16::try_from(self.blocks.len()).map_err(|_| {
            ConfigurationError::InvalidValue {
                block: name.clone(),
                field: "block count",
                value: self.blocks.len() as f32,
            }
        })?);

        let kind = match kind {
            BlockKindDefinition::Conduit {
                settings,
                junction,
                bridge,
            } => {
                settings.validate(&name)?;
                let junction_replacement = junction
                    .map(|replacement| self.resolve_junction(&name, replacement))
                    .transpose()?;
                let bridge_replacement = bridge
                    .map(|replacement| self.resolve_bridge(&name, replacement))
                    .transpose()?;
                BlockKind::Conduit(ConduitConfig {
                    settings,
                    junction_replacement,
                    bridge_replacement,
                })
            }
            BlockKindDefinition::Junction => BlockKind::Junction,
            BlockKindDefinition::Bridge { range, directional } => {
                if range == 0 {
                    return Err(ConfigurationError::InvalidValue {
                        block: name,
                        field: "range",
                        value: 0.0,
                    });
                }
                BlockKind::Bridge { range, directional }
            }
            BlockKindDefinition::Tank { capacity } => {
                if !capacity.is_finite() || capacity <= 0.0 {
                    return Err(ConfigurationError::InvalidCapacity {
                        block: name,
                        capacity,
                    });
                }
                BlockKind::Tank { capacity }
            }
            BlockKindDefinition::Wall => BlockKind::Wall,
        };

        let name: Cow<'static, str> = Cow::Owned(name);
        log::trace!("Registered block `{name}` as {id:?}");
        self.by_name.insert(name.clone(), id);
        self.blocks.push(Block { id, name, kind });
        Ok(id)
    }

    fn resolve_junction(&self, block: &str, replacement: String) -> Result<BlockId, ConfigurationError> {
        let target = self.lookup(block, replacement)?;
        if target.is_junction() {
            Ok(target.id)
        } else {
            Err(ConfigurationError::NotAJunction {
                block: block.to_owned(),
                replacement: target.name.to_string(),
            })
        }
    }

    fn resolve_bridge(
        &self,
        block: &str,
        replacement: String,
    ) -> Result<BridgeReplacement, ConfigurationError> {
        let target = self.lookup(block, replacement)?;
        match target.kind {
            BlockKind::Bridge {
                range,
                directional: true,
            } => Ok(BridgeReplacement::DirectionalDuct {
                block: target.id,
                range,
            }),
            BlockKind::Bridge {
                range,
                directional: false,
            } => Ok(BridgeReplacement::ItemBridge {
                block: target.id,
                range,
            }),
            _ => Err(ConfigurationError::NotABridge {
                block: block.to_owned(),
                replacement: target.name.to_string(),
            }),
        }
    }

    fn lookup(&self, block: &str, replacement: String) -> Result<&Block, ConfigurationError> {
        self.get_by_name(&replacement)
            .and_then(|id| self.get(id))
            .ok_or(ConfigurationError::UnknownReplacement {
                block: block.to_owned(),
                replacement,
            })
    }

    /// Looks a block up by id.
    #[must_use]
    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(usize::from(id.0))
    }

    /// Looks a block id up by name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    /// Number of registered blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterates all blocks.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryExt for BlockRegistry {
    fn freeze(&mut self) {
        self.allows_registering = false;
    }
}
