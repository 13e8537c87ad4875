//! Headless engine binary for the Plotcoin simulation.
//!
//! Loads configuration, seeds the map with human players and bots, and
//! drives the session timeline one block interval at a time until the
//! configured duration has elapsed.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `plotcoin-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Create the session
//! 4. Spawn human players, then bots
//! 5. Run the timeline
//! 6. Log the result

mod error;
mod tally;

use std::path::Path;

use plotcoin_core::config::LoggingConfig;
use plotcoin_core::{Session, SimulationConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::tally::EventTally;

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "plotcoin-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, session setup, or the timeline fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so remember where it
    //    came from and report it afterwards.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("plotcoin-engine starting");
    if from_file {
        info!(path = CONFIG_PATH, "Configuration loaded");
    } else {
        info!("Config file not found, using defaults");
    }
    info!(
        seed = config.world.seed,
        proximity = config.world.proximity,
        humans = config.run.humans,
        bots = config.bots.count,
        duration_secs = config.run.duration_secs,
        "Run parameters"
    );

    // 3. Create the session.
    let duration = config.run.duration_secs;
    let step = config.economy.block_time_secs;
    let humans = config.run.humans;
    let bots = config.bots.count;
    let mut session = Session::new(config)?;

    // 4. Spawn agents.
    for n in 0..humans {
        let (agent, claim) = session.spawn_human(&format!("player-{n}"))?;
        debug!(%agent, %claim, "human spawned");
    }
    for n in 0..bots {
        let (agent, claim) = session.spawn_bot(&format!("bot-{n}"))?;
        debug!(%agent, %claim, "bot spawned");
    }
    info!(
        agents = session.roster().len(),
        claims = session.claims().len(),
        "Agents spawned, entering timeline"
    );

    // 5. Run.
    let tally = run(&mut session, duration, step)?;

    // 6. Log results.
    let summary = session.summary();
    info!(
        now = summary.now,
        claims = summary.claims,
        tiles = summary.tiles,
        miners = summary.miners,
        total_hash_power = summary.total_hash_power,
        blocks_mined = summary.blocks_mined,
        blocks_unclaimed = summary.blocks_unclaimed,
        contracts = summary.contracts,
        active_contracts = summary.active_contracts,
        "Simulation ended"
    );
    tally.log();
    info!("plotcoin-engine shutdown complete");
    Ok(())
}

/// Advance `session` by `duration` seconds in steps of `step`, draining
/// the outboxes after each step.
fn run(session: &mut Session, duration: u64, step: u64) -> Result<EventTally, EngineError> {
    let mut tally = EventTally::default();
    let step = step.max(1);
    while session.now() < duration {
        let target = session.now().saturating_add(step).min(duration);
        session.advance_to(target)?;

        let events = session.drain_events();
        let commands = session.drain_commands();
        tally.record(&events);
        let summary = session.summary();
        debug!(
            now = summary.now,
            events = events.len(),
            commands = commands.len(),
            claims = summary.claims,
            total_hash_power = summary.total_hash_power,
            blocks_mined = summary.blocks_mined,
            "Step complete"
        );
    }
    Ok(tally)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load the configuration from `plotcoin-config.yaml`, falling back to
/// defaults when the file is absent. The flag reports which one happened.
fn load_config() -> Result<(SimulationConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let config = SimulationConfig::from_file(config_path)?;
        Ok((config, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn run_stops_exactly_at_the_duration() {
        let mut config = SimulationConfig::default();
        config.weather.enabled = false;
        let mut session = Session::new(config).unwrap();
        session.spawn_human("player").unwrap();

        let tally = run(&mut session, 1500, 600).unwrap();
        assert_eq!(session.now(), 1500);
        assert_eq!(session.summary().blocks_mined + session.summary().blocks_unclaimed, 2);
        assert_eq!(tally.claims, 0);
    }

    #[test]
    fn zero_step_still_advances() {
        let mut session = Session::new(SimulationConfig::default()).unwrap();
        run(&mut session, 3, 0).unwrap();
        assert_eq!(session.now(), 3);
    }
}
