mod clock;   // host `Clock` backed by a spin-sleeper
mod config;  // settings file + env overrides
mod serial;  // alert output channel
mod sim;     // simulated servo, trigger and echo
mod timer;   // thread standing in for the timer interrupt

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

use clock::SystemClock;
use sim::{SimEcho, SimServo, SimTrigger, blackboard, snapshot};
use sonar_scan::{AlertReporter, DistanceSensor, ScanLoop, SweepController, TimeBase};
use timer::TickDriver;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    info!("Sonar sweep starting.");

    let settings = config::load_settings().context("failed to load configuration")?;
    let radar = settings.radar_config().context("invalid configuration")?;
    let max_steps = settings.scan.max_steps;

    let bb = blackboard(settings.world(radar.servo));
    let clock = SystemClock::new();
    let output = serial::open_output(&settings.output)?;

    let time_base = Arc::new(TimeBase::from(radar.time_base));
    let ticker = TickDriver::spawn(Arc::clone(&time_base), radar.time_base.tick_period)
        .context("failed to spawn time base thread")?;
    info!(
        step_period = ?radar.time_base.step_period(),
        "Time base running."
    );

    let sweep = SweepController::new(SimServo::new(bb.clone(), radar.servo.frame), radar.sweep, radar.servo);
    let sensor = DistanceSensor::new(
        SimTrigger::new(bb.clone(), clock),
        SimEcho::new(bb.clone(), clock),
        radar.sensor,
    );
    let mut scan = ScanLoop::new(
        time_base.signal(),
        sweep,
        sensor,
        AlertReporter::new(output),
        clock,
        radar.scan,
    );

    scan.start();

    if max_steps == 0 {
        info!("Scanning until stopped.");
        scan.run();
    }

    let mut alerts = 0_u64;
    for _ in 0..max_steps {
        scan.wait_for_step();
        if scan.step().alert.is_some() {
            alerts += 1;
        }
    }

    let ticks = ticker.stop();
    let world = snapshot(&bb);
    if world.pings != max_steps {
        warn!(pings = world.pings, max_steps, "Ping count does not match steps run.");
    }
    info!(steps = max_steps, alerts, ticks, "Scan finished.");
    Ok(())
}
