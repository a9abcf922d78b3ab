//! Static content registries: liquids and block types.
//!
//! Both registries accept registrations during start-up and are frozen before
//! the world is built. After freezing every entry is immutable and shared by
//! reference through its id.

pub mod block;
pub mod error;
pub mod liquid;
pub mod vanilla;

pub use block::{
    Block, BlockDefinition, BlockId, BlockKind, BlockKindDefinition, BlockRegistry,
    BridgeReplacement, ConduitConfig, ConduitSettings, PASSTHROUGH_CAPACITY,
};
pub use error::ConfigurationError;
pub use liquid::{Color, LiquidEntry, LiquidId, LiquidRegistry};

/// Shared behaviour of registries that stop accepting entries once frozen.
pub trait RegistryExt {
    /// Stops accepting registrations.
    fn freeze(&mut self);
}

/// All content registries of a running simulation.
pub struct Registry {
    /// Liquid types.
    pub liquids: LiquidRegistry,
    /// Block types.
    pub blocks: BlockRegistry,
}

impl Registry {
    /// Creates empty registries.
    #[must_use]
    pub fn new() -> Self {
        Self {
            liquids: LiquidRegistry::new(),
            blocks: BlockRegistry::new(),
        }
    }

    /// Creates registries pre-filled with the built-in content, still open for registration.
    ///
    /// # Panics
    /// Panics if the built-in content fails validation, which is a programming error.
    #[must_use]
    pub fn with_vanilla() -> Self {
        let mut registry = Self::new();
        vanilla::register_liquids(&mut registry.liquids)
            .expect("built-in liquids are valid");
        vanilla::register_blocks(&mut registry.blocks).expect("built-in blocks are valid");
        registry
    }

    /// Freezes both registries.
    pub fn freeze(&mut self) {
        self.liquids.freeze();
        self.blocks.freeze();
        log::debug!(
            "Registries frozen with {} liquids and {} blocks",
            self.liquids.len(),
            self.blocks.len()
        );
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
