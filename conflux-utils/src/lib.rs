//! Shared geometry, timing and logging helpers for the conflux crates.

pub mod direction;
pub mod logger;
pub mod timer;
pub mod types;

pub use direction::Direction;
pub use timer::Interval;
pub use types::{TeamId, TilePos};
