//! Complete scanner configuration and its validation.

use core::time::Duration;

use thiserror::Error;

use crate::scan::ScanConfig;
use crate::sensor::SensorConfig;
use crate::sweep::{ServoMapping, SweepConfig};
use crate::time_base::TimeBaseConfig;

/// Every tunable of the scanner. `Default` is the reference configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RadarConfig {
    /// Tick period and ticks per step.
    pub time_base: TimeBaseConfig,
    /// Sweep range and step.
    pub sweep: SweepConfig,
    /// Angle → pulse-width map.
    pub servo: ServoMapping,
    /// Ranger timing.
    pub sensor: SensorConfig,
    /// Per-step orchestration.
    pub scan: ScanConfig,
}

/// A configuration that cannot drive the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The time base would never tick.
    #[error("tick period must be non-zero")]
    ZeroTickPeriod,
    /// No step could ever be raised.
    #[error("ticks per step must be at least 1")]
    ZeroTicksPerStep,
    /// The sweep would never move.
    #[error("sweep step must be at least 1 degree")]
    ZeroStep,
    /// The lower sweep bound is not below the upper one.
    #[error("sweep range {min}..={max} is empty")]
    EmptyRange {
        /// Configured lower bound.
        min: u16,
        /// Configured upper bound.
        max: u16,
    },
    /// The park angle lies outside the sweep range.
    #[error("park angle {park} is outside the sweep range {min}..={max}")]
    ParkOutOfRange {
        /// Configured park angle.
        park: u16,
        /// Lower sweep bound.
        min: u16,
        /// Upper sweep bound.
        max: u16,
    },
    /// Every angle maps to the same pulse width.
    #[error("servo scale must be non-zero")]
    FlatServoMapping,
    /// The pulse for some angle in range is longer than the PWM frame.
    #[error("pulse width {pulse} at {angle} degrees does not fit the {frame} frame")]
    PulseExceedsFrame {
        /// Angle whose pulse overflows.
        angle: u16,
        /// Pulse width at that angle.
        pulse: u32,
        /// Frame length.
        frame: u16,
    },
    /// The echo wait would never advance time.
    #[error("echo poll interval must be non-zero")]
    ZeroPollInterval,
    /// The count-to-distance scale would divide by zero.
    #[error("counts per distance unit must be at least 1")]
    ZeroCountsPerUnit,
    /// One of the sensor timeouts is zero.
    #[error("{name} timeout must be non-zero")]
    ZeroTimeout {
        /// Which timeout (`echo rise` or `echo fall`).
        name: &'static str,
    },
}

impl RadarConfig {
    /// Check the invariants the components rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tb = &self.time_base;
        if tb.tick_period == Duration::ZERO {
            return Err(ConfigError::ZeroTickPeriod);
        }
        if tb.ticks_per_step == 0 {
            return Err(ConfigError::ZeroTicksPerStep);
        }

        let sw = &self.sweep;
        if sw.step == 0 {
            return Err(ConfigError::ZeroStep);
        }
        if sw.min_angle >= sw.max_angle {
            return Err(ConfigError::EmptyRange {
                min: sw.min_angle,
                max: sw.max_angle,
            });
        }
        if !(sw.min_angle..=sw.max_angle).contains(&sw.park_angle) {
            return Err(ConfigError::ParkOutOfRange {
                park: sw.park_angle,
                min: sw.min_angle,
                max: sw.max_angle,
            });
        }

        let servo = &self.servo;
        if servo.scale == 0 {
            return Err(ConfigError::FlatServoMapping);
        }
        let pulse = u32::from(servo.base_offset) + u32::from(sw.max_angle) * u32::from(servo.scale);
        if pulse >= u32::from(servo.frame) {
            return Err(ConfigError::PulseExceedsFrame {
                angle: sw.max_angle,
                pulse,
                frame: servo.frame,
            });
        }

        let sensor = &self.sensor;
        if sensor.poll_interval == Duration::ZERO {
            return Err(ConfigError::ZeroPollInterval);
        }
        if sensor.counts_per_unit == 0 {
            return Err(ConfigError::ZeroCountsPerUnit);
        }
        if sensor.rise_timeout == Duration::ZERO {
            return Err(ConfigError::ZeroTimeout { name: "echo rise" });
        }
        if sensor.fall_timeout == Duration::ZERO {
            return Err(ConfigError::ZeroTimeout { name: "echo fall" });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_config_is_valid() {
        assert_eq!(RadarConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_reference_constants() {
        let c = RadarConfig::default();
        assert_eq!(c.time_base.tick_period, Duration::from_millis(20));
        assert_eq!(c.time_base.ticks_per_step, 25);
        assert_eq!(c.sweep.step, 10);
        assert_eq!(c.scan.threshold, 50);
        assert_eq!(c.sensor.trigger_pulse, Duration::from_micros(10));
        assert_eq!(c.sensor.counts_per_unit, 4);
        assert_eq!(c.servo.base_offset, 600);
        assert_eq!(c.servo.scale, 10);
    }

    #[test]
    fn test_empty_range_rejected() {
        let mut c = RadarConfig::default();
        c.sweep.min_angle = 90;
        c.sweep.max_angle = 90;
        assert_eq!(c.validate(), Err(ConfigError::EmptyRange { min: 90, max: 90 }));
    }

    #[test]
    fn test_park_outside_range_rejected() {
        let mut c = RadarConfig::default();
        c.sweep.max_angle = 60;
        assert!(matches!(c.validate(), Err(ConfigError::ParkOutOfRange { park: 90, .. })));
    }

    #[test]
    fn test_pulse_beyond_frame_rejected() {
        let mut c = RadarConfig::default();
        c.servo.scale = 200;
        assert!(matches!(c.validate(), Err(ConfigError::PulseExceedsFrame { .. })));
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut c = RadarConfig::default();
        c.time_base.ticks_per_step = 0;
        assert_eq!(c.validate(), Err(ConfigError::ZeroTicksPerStep));

        let mut c = RadarConfig::default();
        c.sensor.counts_per_unit = 0;
        assert_eq!(c.validate(), Err(ConfigError::ZeroCountsPerUnit));

        let mut c = RadarConfig::default();
        c.sensor.rise_timeout = Duration::ZERO;
        assert_eq!(c.validate(), Err(ConfigError::ZeroTimeout { name: "echo rise" }));
    }
}
