//! Built-in liquids and liquid-logistics blocks.

use std::borrow::Cow;

use crate::{
    BlockDefinition, BlockKindDefinition, BlockRegistry, Color, ConduitSettings,
    ConfigurationError, LiquidEntry, LiquidRegistry,
};

/// Water.
pub const WATER: LiquidEntry = LiquidEntry {
    name: Cow::Borrowed("water"),
    color: Color::rgb(0x596a_b8),
    gas: false,
};

/// Molten slag.
pub const SLAG: LiquidEntry = LiquidEntry {
    name: Cow::Borrowed("slag"),
    color: Color::rgb(0xffa1_66),
    gas: false,
};

/// Crude oil.
pub const OIL: LiquidEntry = LiquidEntry {
    name: Cow::Borrowed("oil"),
    color: Color::rgb(0x3132_3f),
    gas: false,
};

/// Cryofluid coolant.
pub const CRYOFLUID: LiquidEntry = LiquidEntry {
    name: Cow::Borrowed("cryofluid"),
    color: Color::rgb(0x6ecd_ec),
    gas: false,
};

/// Ozone gas.
pub const OZONE: LiquidEntry = LiquidEntry {
    name: Cow::Borrowed("ozone"),
    color: Color::rgb(0xfc81_dd),
    gas: true,
};

/// Registers the built-in liquids.
pub fn register_liquids(liquids: &mut LiquidRegistry) -> Result<(), ConfigurationError> {
    for entry in [WATER, SLAG, OIL, CRYOFLUID, OZONE] {
        liquids.register(entry)?;
    }
    Ok(())
}

fn definition(name: &str, kind: BlockKindDefinition) -> BlockDefinition {
    BlockDefinition {
        name: name.to_owned(),
        kind,
    }
}

/// Registers the built-in blocks, replacements first.
pub fn register_blocks(blocks: &mut BlockRegistry) -> Result<(), ConfigurationError> {
    blocks.register(definition("liquid-junction", BlockKindDefinition::Junction))?;
    blocks.register(definition(
        "bridge-conduit",
        BlockKindDefinition::Bridge {
            range: 4,
            directional: false,
        },
    ))?;
    blocks.register(definition(
        "reinforced-bridge-conduit",
        BlockKindDefinition::Bridge {
            range: 4,
            directional: true,
        },
    ))?;
    blocks.register(definition(
        "liquid-tank",
        BlockKindDefinition::Tank { capacity: 1500.0 },
    ))?;
    blocks.register(definition("copper-wall", BlockKindDefinition::Wall))?;

    blocks.register(definition(
        "conduit",
        BlockKindDefinition::Conduit {
            settings: ConduitSettings::default(),
            junction: Some("liquid-junction".to_owned()),
            bridge: Some("bridge-conduit".to_owned()),
        },
    ))?;
    blocks.register(definition(
        "pulse-conduit",
        BlockKindDefinition::Conduit {
            settings: ConduitSettings {
                capacity: 16.0,
                max_flow: 16.0,
                liquid_pressure: 1.025,
                ..ConduitSettings::default()
            },
            junction: Some("liquid-junction".to_owned()),
            bridge: Some("bridge-conduit".to_owned()),
        },
    ))?;
    blocks.register(definition(
        "plated-conduit",
        BlockKindDefinition::Conduit {
            settings: ConduitSettings {
                capacity: 16.0,
                max_flow: 16.0,
                liquid_pressure: 1.025,
                leaks: false,
                ..ConduitSettings::default()
            },
            junction: Some("liquid-junction".to_owned()),
            bridge: Some("bridge-conduit".to_owned()),
        },
    ))?;
    blocks.register(definition(
        "reinforced-conduit",
        BlockKindDefinition::Conduit {
            settings: ConduitSettings {
                capacity: 16.0,
                max_flow: 16.0,
                leaks: false,
                ..ConduitSettings::default()
            },
            junction: None,
            bridge: Some("reinforced-bridge-conduit".to_owned()),
        },
    ))?;
    Ok(())
}
