use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use quadplane_hil::config::DroneConfig;
use quadplane_hil::hil::{ConstantEnvironment, Drone, LockstepClock, TcpRelay};

/// Macro integration step (100 Hz).
const STEP_US: u64 = 10_000;

/// How long one tick may wait for the autopilot's lockstep acknowledgment
/// before the loop retries; a silent autopilot cannot stall real time.
const UNLOCK_TIMEOUT: Duration = Duration::from_millis(50);

const DEFAULT_ADDRESS: &str = "tcpin:0.0.0.0:4560";

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config_path = args
        .next()
        .context("usage: quadplane-hil <config-file> [mavlink-address]")?;
    let address = args.next().unwrap_or_else(|| DEFAULT_ADDRESS.into());

    let config = DroneConfig::from_file(Path::new(&config_path))
        .with_context(|| format!("loading airframe config {}", config_path))?;
    info!("airframe loaded: {} kg, wing area {} m^2", config.mass, config.s);

    info!("waiting for autopilot on {}", address);
    let relay = TcpRelay::listen(&address)
        .with_context(|| format!("binding autopilot link on {}", address))?;
    info!("autopilot connected");

    let clock = LockstepClock::new();
    let environment = ConstantEnvironment::default();
    let mut drone = Drone::new(config, relay, clock.clone(), environment)?;

    // Lockstep tick loop: advance simulated time, run the tick, then let the
    // autopilot's acknowledgment (relayed through the clock gate) pace the
    // next one. Ends when the link goes down; in-flight ticks always finish.
    while drone.connection_open() {
        clock.advance(STEP_US);
        drone.update(STEP_US);
        clock.wait_unlocked(UNLOCK_TIMEOUT);
    }
    info!("autopilot connection closed, shutting down");

    Ok(())
}
