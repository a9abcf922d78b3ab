//! Start-up configuration errors.

use thiserror::Error;

/// A block or liquid definition that cannot be used.
///
/// These are fatal: they are raised while registries are being filled and
/// must stop initialisation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    /// A registry received an entry after it was frozen.
    #[error("cannot register `{0}` after the registry is frozen")]
    Frozen(String),
    /// Two entries share a name.
    #[error("`{0}` is already registered")]
    Duplicate(String),
    /// A capacity was zero, negative or not finite.
    #[error("block `{block}` has invalid capacity {capacity}")]
    InvalidCapacity {
        /// Offending block.
        block: String,
        /// Rejected value.
        capacity: f32,
    },
    /// A rate or threshold was outside its allowed range.
    #[error("block `{block}` has invalid {field}: {value}")]
    InvalidValue {
        /// Offending block.
        block: String,
        /// Field name.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// A replacement names a block that was never registered.
    #[error("block `{block}` refers to unknown replacement `{replacement}`")]
    UnknownReplacement {
        /// Offending block.
        block: String,
        /// Missing replacement name.
        replacement: String,
    },
    /// The bridge replacement cannot span gaps.
    #[error("block `{block}` uses `{replacement}` as bridge replacement, which is not a bridge")]
    NotABridge {
        /// Offending block.
        block: String,
        /// Replacement name.
        replacement: String,
    },
    /// The junction replacement cannot pass crossing flows.
    #[error("block `{block}` uses `{replacement}` as junction replacement, which is not a junction")]
    NotAJunction {
        /// Offending block.
        block: String,
        /// Replacement name.
        replacement: String,
    },
    /// A colour string was not `#rrggbb` or `#rrggbbaa`.
    #[error("invalid colour `{0}`")]
    InvalidColor(String),
}
