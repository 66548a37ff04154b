//! Sweep state machine and the servo it positions.

use core::fmt;

use embedded_hal::pwm::SetDutyCycle;

/// Travel direction of the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Increasing angle (+1).
    #[default]
    Forward,
    /// Decreasing angle (-1).
    Reverse,
}

impl Direction {
    /// `+1` or `-1`.
    pub const fn sign(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// Angular range and step of the sweep, in whole degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Degrees moved per scan step.
    pub step: u16,
    /// Lower bound of the sweep.
    pub min_angle: u16,
    /// Upper bound of the sweep.
    pub max_angle: u16,
    /// Angle commanded once at startup, before the first step.
    pub park_angle: u16,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            step: 10,
            min_angle: 0,
            max_angle: 180,
            park_angle: 90,
        }
    }
}

/// Affine angle → pulse-width map of the servo.
///
/// With the reference values a degree is 10 µs of pulse, 0° is 600 µs and
/// 180° is 2400 µs inside a 20 000 µs frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoMapping {
    /// Pulse width at 0°.
    pub base_offset: u16,
    /// Pulse width added per degree.
    pub scale: u16,
    /// Length of one PWM frame in the same unit as the pulse width.
    pub frame: u16,
}

impl ServoMapping {
    /// Pulse width for `angle`. The caller is expected to have clamped it.
    pub fn command(&self, angle: u16) -> u16 {
        let pulse = u32::from(self.base_offset) + u32::from(angle) * u32::from(self.scale);
        u16::try_from(pulse).unwrap_or(u16::MAX)
    }
}

impl Default for ServoMapping {
    fn default() -> Self {
        Self {
            base_offset: 600,
            scale: 10,
            frame: 20_000,
        }
    }
}

/// Current sweep position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanState {
    /// Angle in degrees, always inside the configured range.
    pub angle: u16,
    /// Direction of the next step.
    pub direction: Direction,
}

impl ScanState {
    /// Construct a state.
    pub const fn new(angle: u16, direction: Direction) -> Self {
        ScanState { angle, direction }
    }

    /// The state one step later. Reverses exactly when a bound is reached.
    pub fn advanced(self, config: &SweepConfig) -> ScanState {
        let min = i32::from(config.min_angle);
        let max = i32::from(config.max_angle);
        let next = i32::from(self.angle) + i32::from(config.step) * self.direction.sign();

        if next >= max {
            ScanState::new(config.max_angle, Direction::Reverse)
        } else if next <= min {
            ScanState::new(config.min_angle, Direction::Forward)
        } else {
            // min < next < max, so it fits.
            ScanState::new(next as u16, self.direction)
        }
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.direction {
            Direction::Forward => '+',
            Direction::Reverse => '-',
        };
        write!(f, "{}° ({})", self.angle, arrow)
    }
}

/// Owns the scan position and the servo output.
pub struct SweepController<S> {
    servo: S,
    state: ScanState,
    config: SweepConfig,
    mapping: ServoMapping,
}

impl<S: SetDutyCycle> SweepController<S> {
    /// Start at the lower bound, moving forward. The servo is not written.
    pub fn new(servo: S, config: SweepConfig, mapping: ServoMapping) -> Self {
        Self {
            servo,
            state: ScanState::new(config.min_angle, Direction::Forward),
            config,
            mapping,
        }
    }

    /// Current position.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Current angle in degrees.
    pub fn angle(&self) -> u16 {
        self.state.angle
    }

    /// Sweep range and step.
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Move one step, reversing at the bounds.
    pub fn advance(&mut self) -> ScanState {
        self.state = self.state.advanced(&self.config);
        self.state
    }

    /// Clamp `angle` to the sweep range and command the servo to it.
    ///
    /// Returns the pulse width written.
    pub fn apply(&mut self, angle: i32) -> Result<u16, S::Error> {
        let clamped = angle.clamp(i32::from(self.config.min_angle), i32::from(self.config.max_angle));
        let command = self.mapping.command(clamped as u16);
        self.servo.set_duty_cycle(command)?;
        Ok(command)
    }

    /// Command the servo to the current angle.
    pub fn apply_current(&mut self) -> Result<u16, S::Error> {
        self.apply(i32::from(self.state.angle))
    }

    /// Command the startup posture without touching the scan position.
    pub fn park(&mut self) -> Result<u16, S::Error> {
        self.apply(i32::from(self.config.park_angle))
    }
}
