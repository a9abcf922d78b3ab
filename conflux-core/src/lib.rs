//! Conduit simulation core.
//!
//! Buildings live on a [`World`] grid. Conduits derive their shape from their
//! neighbours ([`autotile`]), push liquid forward every tick ([`flow`]) and
//! are rewritten into junctions or bridges while still plans ([`placement`]).

pub mod autotile;
pub mod building;
pub mod flow;
pub mod liquid_container;
pub mod placement;
pub mod render;
pub mod world;

pub use autotile::{ProximityState, TilingDescriptor};
pub use building::{BasicBuilding, Building, ConduitBuilding, ConduitSave};
pub use flow::FlowOutcome;
pub use liquid_container::LiquidContainer;
pub use placement::{BridgeLink, BuildPlan, LinkOffset};
pub use render::ConduitRenderState;
pub use world::{TickStats, World, WorldError};
