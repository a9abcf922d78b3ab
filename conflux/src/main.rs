//! Conflux command-line runner.

use std::sync::Arc;

use anyhow::Context;
use conflux::config::{CONFIG_PATH, CONFLUX_CONFIG, ConfigOrigin};
use conflux::scenario::ScenarioLayout;
use conflux::{Simulation, bootstrap_registry};
use conflux_utils::logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, origin) = &*CONFLUX_CONFIG;
    logger::init(&config.log_level).context("failed to initialise logging")?;
    match origin {
        ConfigOrigin::Loaded => log::info!("Loaded configuration from {CONFIG_PATH}"),
        ConfigOrigin::Created => log::info!("Wrote default configuration to {CONFIG_PATH}"),
    }

    let registry = bootstrap_registry(config).context("invalid content configuration")?;
    let layout = match &config.scenario {
        Some(path) => ScenarioLayout::load(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?,
        None => ScenarioLayout::demo().context("built-in scenario is malformed")?,
    };
    let (world, sources) = layout
        .build(Arc::new(registry))
        .context("failed to build scenario")?;

    let mut simulation = Simulation::new(world, sources);
    let cancel_token = simulation.cancel_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Interrupted, shutting down");
                cancel_token.cancel();
            }
            Err(err) => log::warn!("Failed to listen for ctrl-c: {err}"),
        }
    });

    let summary = simulation.run(config).await;
    log::info!(
        "Injected {:.2}, moved {:.2}, leaked {:.2}; {:.2} still held",
        summary.injected,
        summary.moved,
        summary.leaked,
        simulation.world().total_held()
    );
    Ok(())
}
