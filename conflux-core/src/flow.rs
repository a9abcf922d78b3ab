//! Per-tick liquid advancement along conduits.
//!
//! Each conduit pushes toward the tile it faces and nowhere else. The update
//! reads the source and the target, then applies the transfer, so a conduit
//! only ever borrows one building mutably at a time.

use conflux_registry::{Block, ConduitSettings, LiquidId};
use conflux_utils::TilePos;

use crate::building::Building;
use crate::world::World;

/// Liquid a leaking conduit discards per attempt, as a divisor of its contents.
const LEAK_DIVISOR: f32 = 1.5;

/// What one conduit update did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowOutcome {
    /// Liquid moved into the conduit ahead.
    Moved(f32),
    /// Liquid was discarded onto the empty tile ahead.
    Leaked(f32),
    /// Nothing ahead can take liquid, or the target is fuller than the source.
    Blocked,
    /// The conduit ahead refused the liquid.
    Rejected,
    /// The conduit is empty and went to sleep.
    Idle,
    /// The flow timer has not elapsed yet.
    Waiting,
}

fn conduit_settings(world: &World, pos: TilePos) -> Option<(ConduitSettings, &dyn Building)> {
    let building = world.building_at(pos)?;
    building.as_conduit()?;
    let settings = world.block(building.block()).and_then(Block::as_conduit)?.settings;
    Some((settings, building))
}

/// Runs the update of the conduit at `pos` for a tick of length `delta`.
pub fn update_conduit(world: &mut World, pos: TilePos, delta: f32) -> FlowOutcome {
    let Some((settings, source)) = conduit_settings(world, pos) else {
        log::warn!("No conduit with a known block at {pos}, skipping its update");
        return FlowOutcome::Idle;
    };
    let team = source.team();
    let next = pos.relative(source.rotation());

    let Some(conduit) = world.conduit_at_mut(pos) else {
        return FlowOutcome::Idle;
    };
    conduit.update_smoothing(settings.smoothing, delta);
    if conduit.liquid_container().amount() <= settings.sleep_epsilon {
        conduit.sleep();
        return FlowOutcome::Idle;
    }
    if !conduit.flow_due(settings.flow_interval, delta) {
        return FlowOutcome::Waiting;
    }
    let container = *conduit.liquid_container();
    let Some(liquid) = container.current() else {
        conduit.sleep();
        return FlowOutcome::Idle;
    };

    let target = conduit_settings(world, next)
        .map(|(target_settings, target)| (target_settings, target.team() == team));
    match target {
        Some((target_settings, true)) => {
            move_forward(world, pos, next, liquid, &settings, &target_settings, delta)
        }
        Some((_, false)) => FlowOutcome::Rejected,
        None => leak(world, pos, next, liquid, &settings),
    }
}

fn move_forward(
    world: &mut World,
    pos: TilePos,
    next: TilePos,
    liquid: LiquidId,
    settings: &ConduitSettings,
    target_settings: &ConduitSettings,
    delta: f32,
) -> FlowOutcome {
    let Some(target) = world.conduit_at_mut(next) else {
        return FlowOutcome::Blocked;
    };
    if !target.accept_liquid(pos, liquid, target_settings.priming_threshold) {
        return FlowOutcome::Rejected;
    }
    let target_container = *target.liquid_container();

    let Some(source) = world.conduit_at(pos) else {
        return FlowOutcome::Blocked;
    };
    let held = source.liquid_container().amount();
    let capacity = source.liquid_container().capacity();
    let fract = held / capacity * settings.liquid_pressure;
    let ofract = target_container.fill_ratio();
    if ofract > fract {
        return FlowOutcome::Blocked;
    }

    let flow = ((fract - ofract).clamp(0.0, 1.0) * capacity)
        .min(held)
        .min(target_container.free_space(liquid))
        .min(settings.max_flow * delta);
    if flow <= 0.0 {
        return FlowOutcome::Blocked;
    }

    let stored = world
        .conduit_at_mut(next)
        .map_or(0.0, |target| target.handle_liquid(liquid, flow));
    if let Some(source) = world.conduit_at_mut(pos) {
        source.liquid_container_mut().remove(stored);
    }
    FlowOutcome::Moved(stored)
}

fn leak(
    world: &mut World,
    pos: TilePos,
    next: TilePos,
    liquid: LiquidId,
    settings: &ConduitSettings,
) -> FlowOutcome {
    if !settings.leaks || !world.tile_in_bounds(next) || world.building_at(next).is_some() {
        return FlowOutcome::Blocked;
    }
    let Some(conduit) = world.conduit_at_mut(pos) else {
        return FlowOutcome::Blocked;
    };
    let amount = conduit.liquid_container().amount() / LEAK_DIVISOR;
    let leaked = conduit.liquid_container_mut().remove(amount);
    log::trace!("Conduit at {pos} leaked {leaked:.4} of {liquid:?} onto {next}");
    FlowOutcome::Leaked(leaked)
}
