#![doc = "Step-paced sweep scanning with a servo and a pulse-echo ranger."]
#![doc = ""]
#![doc = "A periodic [`TimeBase`] raises a [`StepSignal`]; the [`ScanLoop`] consumes it,"]
#![doc = "positions the [`SweepController`], measures with the [`DistanceSensor`] and"]
#![doc = "hands close readings to the [`AlertReporter`]. Hardware is reached through"]
#![doc = "`embedded-hal` pin and PWM traits, and every wait through a [`Clock`]."]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod report;
pub mod scan;
pub mod sensor;
pub mod sweep;
pub mod time_base;

#[cfg(test)]
mod testing;

pub use clock::{Clock, Instant, ManualClock};
pub use config::{ConfigError, RadarConfig};
pub use report::{Alert, AlertReporter};
pub use scan::{ScanConfig, ScanLoop, StepOutcome, is_detection};
pub use sensor::{DistanceSample, DistanceSensor, MeasureError, SensorConfig};
pub use sweep::{Direction, ScanState, ServoMapping, SweepConfig, SweepController};
pub use time_base::{StepSignal, TimeBase, TimeBaseConfig};
