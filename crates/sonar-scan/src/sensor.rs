//! Pulse-echo ranger (HC-SR04 class) driven over two digital pins.

use core::fmt;
use core::time::Duration;

use embedded_hal::digital::{ErrorKind, InputPin, OutputPin};
use thiserror::Error;
use tracing::{debug, warn};

use crate::clock::Clock;

/// Timing contract of the ranger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    /// How long the trigger line is held high.
    pub trigger_pulse: Duration,
    /// Longest wait for the echo line to rise after the trigger falls.
    pub rise_timeout: Duration,
    /// Longest time the echo line may stay high.
    pub fall_timeout: Duration,
    /// Hold between two reads of the echo line.
    pub poll_interval: Duration,
    /// Echo polls per distance unit.
    pub counts_per_unit: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        // 4 polls of 14.5 µs ≈ 58 µs of echo, the round trip for one centimeter.
        Self {
            trigger_pulse: Duration::from_micros(10),
            rise_timeout: Duration::from_millis(30),
            fall_timeout: Duration::from_millis(30),
            poll_interval: Duration::from_nanos(14_500),
            counts_per_unit: 4,
        }
    }
}

/// One distance reading.
///
/// An invalid sample always carries the value 0; callers must read that as
/// "no reliable reading", not "object at distance 0".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DistanceSample {
    /// Distance in sensor units (centimeters with the reference scale).
    pub value: u32,
    /// Whether both echo waits completed within their bounds.
    pub valid: bool,
}

impl DistanceSample {
    /// The sentinel returned on any timeout.
    pub const INVALID: DistanceSample = DistanceSample {
        value: 0,
        valid: false,
    };

    /// A valid reading of `value`.
    pub const fn reading(value: u32) -> Self {
        DistanceSample { value, valid: true }
    }

    /// The distance, if the sample is valid.
    pub fn distance(&self) -> Option<u32> {
        self.valid.then_some(self.value)
    }
}

impl fmt::Display for DistanceSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            write!(f, "{} cm", self.value)
        } else {
            write!(f, "no reading")
        }
    }
}

/// Why a measurement produced no reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MeasureError {
    /// The echo line never rose.
    #[error("no echo within {0:?}")]
    NoEcho(Duration),
    /// The echo line never fell.
    #[error("echo still high after {0:?}")]
    EchoStuck(Duration),
    /// A pin read or write failed.
    #[error("sensor pin failure: {0:?}")]
    Pin(ErrorKind),
}

fn pin_error<E: embedded_hal::digital::Error>(err: E) -> MeasureError {
    MeasureError::Pin(err.kind())
}

/// Trigger/echo ranger.
pub struct DistanceSensor<T, E> {
    trigger: T,
    echo: E,
    config: SensorConfig,
}

impl<T, E> DistanceSensor<T, E>
where
    T: OutputPin,
    E: InputPin,
{
    /// Wrap the two pins. The trigger is not touched until the first measurement.
    pub fn new(trigger: T, echo: E, config: SensorConfig) -> Self {
        Self {
            trigger,
            echo,
            config,
        }
    }

    /// Measure once, folding every failure into [`DistanceSample::INVALID`].
    pub fn measure<C: Clock>(&mut self, clock: &C) -> DistanceSample {
        match self.try_measure(clock) {
            Ok(value) => DistanceSample::reading(value),
            Err(err @ MeasureError::Pin(_)) => {
                warn!(%err, "Distance measurement failed");
                DistanceSample::INVALID
            }
            Err(err) => {
                debug!(%err, "Distance measurement timed out");
                DistanceSample::INVALID
            }
        }
    }

    /// Measure once, reporting why no reading was produced.
    ///
    /// Blocks for at most `trigger_pulse + rise_timeout + fall_timeout` plus
    /// one poll interval per phase. Echo reads are paced on absolute deadlines
    /// `start + k * poll_interval`, so time spent reading the pin or the clock
    /// does not stretch the count and `counts_per_unit` stays a valid
    /// calibration on a real clock.
    pub fn try_measure<C: Clock>(&mut self, clock: &C) -> Result<u32, MeasureError> {
        let cfg = self.config;

        self.trigger.set_high().map_err(pin_error)?;
        clock.hold(cfg.trigger_pulse);
        self.trigger.set_low().map_err(pin_error)?;

        let start = clock.now();
        while !self.echo.is_high().map_err(pin_error)? {
            if clock.elapsed_since(start) >= cfg.rise_timeout {
                return Err(MeasureError::NoEcho(cfg.rise_timeout));
            }
            clock.hold(cfg.poll_interval);
        }

        let start = clock.now();
        let mut count: u32 = 0;
        while self.echo.is_high().map_err(pin_error)? {
            if clock.elapsed_since(start) >= cfg.fall_timeout {
                return Err(MeasureError::EchoStuck(cfg.fall_timeout));
            }
            count = count.saturating_add(1);
            let deadline = start + cfg.poll_interval * count;
            clock.hold(deadline.saturating_duration_since(clock.now()));
        }

        Ok(count / cfg.counts_per_unit.max(1))
    }

    /// Give the pins back.
    pub fn release(self) -> (T, E) {
        (self.trigger, self.echo)
    }
}
