//! The scan loop: one position/settle/measure/report/advance pass per step.

use core::time::Duration;
use std::io::Write;

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::report::{Alert, AlertReporter};
use crate::sensor::{DistanceSample, DistanceSensor};
use crate::sweep::{ScanState, SweepController};
use crate::time_base::StepSignal;

/// Per-step orchestration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Readings strictly below this (and above zero) are reported.
    pub threshold: u32,
    /// Hold between commanding the servo and measuring.
    pub settle: Duration,
    /// Hold between two checks of the step signal.
    pub step_poll: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threshold: 50,
            settle: Duration::from_millis(50),
            step_poll: Duration::from_millis(1),
        }
    }
}

/// Whether `sample` is a detection under `threshold`.
///
/// Invalid samples, zero and anything at or above the threshold are not.
pub fn is_detection(sample: DistanceSample, threshold: u32) -> bool {
    sample.valid && sample.value > 0 && sample.value < threshold
}

/// What happened during one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// Angle the step measured at.
    pub angle: u16,
    /// Pulse width written to the servo, if the write succeeded.
    pub command: Option<u16>,
    /// The reading.
    pub sample: DistanceSample,
    /// The alert emitted, if the reading was a detection.
    pub alert: Option<Alert>,
    /// Scan position after advancing.
    pub next: ScanState,
}

/// Couples the step signal, the sweep, the ranger and the reporter.
pub struct ScanLoop<'a, S, T, E, W, C> {
    signal: &'a StepSignal,
    sweep: SweepController<S>,
    sensor: DistanceSensor<T, E>,
    reporter: AlertReporter<W>,
    clock: C,
    config: ScanConfig,
}

impl<'a, S, T, E, W, C> ScanLoop<'a, S, T, E, W, C>
where
    S: SetDutyCycle,
    T: OutputPin,
    E: InputPin,
    W: Write,
    C: Clock,
{
    /// Assemble a loop. Nothing is written to the hardware until
    /// [`ScanLoop::start`] or the first step.
    pub fn new(
        signal: &'a StepSignal,
        sweep: SweepController<S>,
        sensor: DistanceSensor<T, E>,
        reporter: AlertReporter<W>,
        clock: C,
        config: ScanConfig,
    ) -> Self {
        Self {
            signal,
            sweep,
            sensor,
            reporter,
            clock,
            config,
        }
    }

    /// Park the servo and print the banner. Call once before the first step.
    ///
    /// The park angle is independent of the scan position, which still starts
    /// at the lower bound.
    pub fn start(&mut self) {
        match self.sweep.park() {
            Ok(command) => info!(
                angle = self.sweep.config().park_angle,
                command, "Servo parked"
            ),
            Err(err) => warn!(?err, "Failed to park servo"),
        }
        if let Err(err) = self.reporter.banner(self.config.threshold) {
            warn!(%err, "Failed to write banner");
        }
    }

    /// Block until the step signal is raised, then clear it.
    pub fn wait_for_step(&self) {
        while !self.signal.take() {
            self.clock.hold(self.config.step_poll);
        }
    }

    /// Run one pass if a step is pending.
    pub fn poll(&mut self) -> Option<StepOutcome> {
        self.signal.take().then(|| self.step())
    }

    /// One pass: position, settle, measure, filter and report, advance.
    pub fn step(&mut self) -> StepOutcome {
        let angle = self.sweep.angle();

        let command = match self.sweep.apply_current() {
            Ok(command) => Some(command),
            Err(err) => {
                warn!(angle, ?err, "Failed to command servo");
                None
            }
        };

        self.clock.hold(self.config.settle);

        let sample = self.sensor.measure(&self.clock);

        let alert = if is_detection(sample, self.config.threshold) {
            let alert = Alert {
                angle,
                distance: sample.value,
            };
            if let Err(err) = self.reporter.report(alert.angle, alert.distance) {
                warn!(%err, "Failed to write alert");
            }
            Some(alert)
        } else {
            None
        };

        let next = self.sweep.advance();
        debug!(angle, %sample, detected = alert.is_some(), %next, "Scan step");

        StepOutcome {
            angle,
            command,
            sample,
            alert,
            next,
        }
    }

    /// Step forever at the signal's cadence.
    pub fn run(mut self) -> ! {
        loop {
            self.wait_for_step();
            self.step();
        }
    }

    /// Current scan position.
    pub fn state(&self) -> ScanState {
        self.sweep.state()
    }

    /// The reporter and its sink.
    pub fn reporter(&self) -> &AlertReporter<W> {
        &self.reporter
    }
}
