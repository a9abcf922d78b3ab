//! # Conflux
//!
//! Runs a conduit scenario at a fixed tick rate until it is interrupted or
//! reaches its configured length.

use std::time::Duration;

use conflux_core::{TickStats, World};
use conflux_registry::{ConfigurationError, Registry, vanilla};
use tokio::select;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::config::ConfluxConfig;
use crate::scenario::LiquidSource;

/// Configuration loading.
pub mod config;
/// Scenario layouts.
pub mod scenario;

/// Builds and freezes the registries: built-in content first, then the
/// liquids and blocks of the configuration.
pub fn bootstrap_registry(config: &ConfluxConfig) -> Result<Registry, ConfigurationError> {
    let mut registry = Registry::new();
    vanilla::register_liquids(&mut registry.liquids)?;
    vanilla::register_blocks(&mut registry.blocks)?;
    for liquid in &config.liquids {
        registry.liquids.register(liquid.clone())?;
    }
    for block in &config.blocks {
        registry.blocks.register(block.clone())?;
    }
    registry.freeze();
    Ok(registry)
}

/// Totals over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    /// Ticks simulated.
    pub ticks: u64,
    /// Liquid offered by sources that fit.
    pub injected: f32,
    /// Liquid moved between conduits.
    pub moved: f32,
    /// Liquid discarded by leaking conduits.
    pub leaked: f32,
}

/// A running scenario.
pub struct Simulation {
    /// The cancellation token for graceful shutdown.
    pub cancel_token: CancellationToken,
    world: World,
    sources: Vec<LiquidSource>,
    summary: RunSummary,
}

impl Simulation {
    /// Wraps a built world and its sources.
    #[must_use]
    pub fn new(world: World, sources: Vec<LiquidSource>) -> Self {
        Self {
            cancel_token: CancellationToken::new(),
            world,
            sources,
            summary: RunSummary::default(),
        }
    }

    /// The simulated world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Totals so far.
    #[must_use]
    pub const fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Feeds the sources and advances the world by one tick.
    pub fn step(&mut self, delta: f32) -> TickStats {
        for source in &self.sources {
            self.summary.injected += self.world.inject(source.pos, source.liquid, source.rate * delta);
        }
        let stats = self.world.tick(delta);
        self.summary.ticks = self.world.tick_count();
        self.summary.moved += stats.moved;
        self.summary.leaked += stats.leaked;
        stats
    }

    /// Ticks at the configured rate until cancelled or `run_ticks` is reached.
    pub async fn run(&mut self, config: &ConfluxConfig) -> RunSummary {
        log::info!(
            "Running at {} ticks per second{}",
            config.tick_rate,
            config
                .run_ticks
                .map_or_else(String::new, |ticks| format!(" for {ticks} ticks"))
        );

        let mut ticker = interval(Duration::from_secs_f64(1.0 / f64::from(config.tick_rate)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let cancel_token = self.cancel_token.clone();

        loop {
            select! {
                () = cancel_token.cancelled() => {
                    break;
                }
                _ = ticker.tick() => {
                    let stats = self.step(1.0);
                    let ticks = self.summary.ticks;
                    if ticks % config.stats_interval == 0 {
                        log::info!(
                            "Tick {ticks}: {} active, {} idle, moved {:.2}, leaked {:.2}",
                            stats.updated,
                            stats.skipped,
                            self.summary.moved,
                            self.summary.leaked
                        );
                    }
                    if config.run_ticks.is_some_and(|limit| ticks >= limit) {
                        break;
                    }
                }
            }
        }

        log::info!("Stopped after {} ticks", self.summary.ticks);
        self.summary
    }

    /// Stops a running simulation.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}
