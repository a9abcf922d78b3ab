//! Liquid types.

use std::borrow::Cow;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{ConfigurationError, RegistryExt};

/// Liquid id, the index of the liquid in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, Deserialize)]
pub struct LiquidId(pub u16);

/// An RGBA colour, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Builds an opaque colour from a `0xRRGGBB` literal.
    #[must_use]
    pub const fn rgb(hex: u32) -> Self {
        Self {
            r: (hex >> 16) as u8,
            g: (hex >> 8) as u8,
            b: hex as u8,
            a: 0xff,
        }
    }

    /// Returns the same colour with full alpha.
    #[must_use]
    pub const fn opaque(self) -> Self {
        Self { a: 0xff, ..self }
    }

    /// Parses `rrggbb` or `rrggbbaa`, with or without a leading `#`.
    pub fn from_hex(value: &str) -> Result<Self, ConfigurationError> {
        let digits = value.strip_prefix('#').unwrap_or(value);
        let invalid = || ConfigurationError::InvalidColor(value.to_owned());
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if digits.len() == 8 { channel(6)? } else { 0xff },
        })
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

/// Static description of a liquid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LiquidEntry {
    /// Unique name.
    pub name: Cow<'static, str>,
    /// Colour used to tint conduit contents.
    pub color: Color,
    /// Gases use animated regions instead of the still liquid texture.
    #[serde(default)]
    pub gas: bool,
}

/// Registry of every liquid type.
pub struct LiquidRegistry {
    entries: Vec<LiquidEntry>,
    by_name: FxHashMap<Cow<'static, str>, LiquidId>,
    allows_registering: bool,
}

impl LiquidRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_name: FxHashMap::default(),
            allows_registering: true,
        }
    }

    /// Registers a liquid and returns its id.
    pub fn register(&mut self, entry: LiquidEntry) -> Result<LiquidId, ConfigurationError> {
        if !self.allows_registering {
            return Err(ConfigurationError::Frozen(entry.name.into_owned()));
        }
        if self.by_name.contains_key(&entry.name) {
            return Err(ConfigurationError::Duplicate(entry.name.into_owned()));
        }
        let id = LiquidId(u16::try_from(self.entries.len()).map_err(|_| {
            ConfigurationError::InvalidValue {
                block: entry.name.to_string(),
                field: "liquid count",
                value: self.entries.len() as f32,
            }
        })?);
        log::trace!("Registered liquid `{}` as {id:?}", entry.name);
        self.by_name.insert(entry.name.clone(), id);
        self.entries.push(entry);
        Ok(id)
    }

    /// Looks a liquid up by id.
    #[must_use]
    pub fn get(&self, id: LiquidId) -> Option<&LiquidEntry> {
        self.entries.get(usize::from(id.0))
    }

    /// Looks a liquid id up by name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<LiquidId> {
        self.by_name.get(name).copied()
    }

    /// Number of registered liquids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates all liquids with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (LiquidId, &LiquidEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (LiquidId(index as u16), entry))
    }
}

impl Default for LiquidRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryExt for LiquidRegistry {
    fn freeze(&mut self) {
        self.allows_registering = false;
    }
}
