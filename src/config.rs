use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

use sonar_scan::{
    RadarConfig, ScanConfig, SensorConfig, ServoMapping, SweepConfig, TimeBaseConfig,
};

use crate::sim::{Acoustics, Target, World};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const CONFIG_PATH_VAR: &str = "SONAR_CONFIG";
const ENV_PREFIX: &str = "SONAR";

/// Everything read from the config file and `SONAR__*` variables.
///
/// Fields carry their unit in the name; missing fields keep the reference
/// values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub time_base: TimeBaseSettings,
    pub sweep: SweepSettings,
    pub servo: ServoSettings,
    pub sensor: SensorSettings,
    pub scan: ScanSettings,
    pub output: OutputSettings,
    pub world: WorldSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeBaseSettings {
    pub tick_period_ms: u64,
    pub ticks_per_step: u32,
}

impl Default for TimeBaseSettings {
    fn default() -> Self {
        let d = TimeBaseConfig::default();
        Self {
            tick_period_ms: d.tick_period.as_millis() as u64,
            ticks_per_step: d.ticks_per_step,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    pub step_deg: u16,
    pub min_deg: u16,
    pub max_deg: u16,
    pub park_deg: u16,
}

impl Default for SweepSettings {
    fn default() -> Self {
        let d = SweepConfig::default();
        Self {
            step_deg: d.step,
            min_deg: d.min_angle,
            max_deg: d.max_angle,
            park_deg: d.park_angle,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServoSettings {
    pub base_offset_us: u16,
    pub us_per_deg: u16,
    pub frame_us: u16,
}

impl Default for ServoSettings {
    fn default() -> Self {
        let d = ServoMapping::default();
        Self {
            base_offset_us: d.base_offset,
            us_per_deg: d.scale,
            frame_us: d.frame,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    pub trigger_pulse_us: u64,
    pub rise_timeout_us: u64,
    pub fall_timeout_us: u64,
    pub poll_interval_ns: u64,
    pub counts_per_cm: u32,
}

impl Default for SensorSettings {
    fn default() -> Self {
        let d = SensorConfig::default();
        Self {
            trigger_pulse_us: d.trigger_pulse.as_micros() as u64,
            rise_timeout_us: d.rise_timeout.as_micros() as u64,
            fall_timeout_us: d.fall_timeout.as_micros() as u64,
            poll_interval_ns: d.poll_interval.as_nanos() as u64,
            counts_per_cm: d.counts_per_unit,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub threshold_cm: u32,
    pub settle_ms: u64,
    pub step_poll_us: u64,
    /// Steps to run before exiting; 0 runs forever.
    pub max_steps: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        let d = ScanConfig::default();
        Self {
            threshold_cm: d.threshold,
            settle_ms: d.settle.as_millis() as u64,
            step_poll_us: d.step_poll.as_micros() as u64,
            max_steps: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Serial device for alerts; stdout when unset.
    pub port: Option<String>,
    pub baud_rate: u32,
    pub write_timeout_ms: u64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 9600,
            write_timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetSettings {
    pub bearing_deg: u16,
    #[serde(default)]
    pub half_width_deg: u16,
    pub distance_cm: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub rise_latency_us: u64,
    pub round_trip_us_per_cm: u64,
    pub targets: Vec<TargetSettings>,
}

impl Default for WorldSettings {
    fn default() -> Self {
        let d = Acoustics::default();
        Self {
            rise_latency_us: d.rise_latency.as_micros() as u64,
            round_trip_us_per_cm: d.round_trip_per_cm.as_micros() as u64,
            targets: Vec::new(),
        }
    }
}

impl Settings {
    /// Convert to the scanner configuration and validate it.
    pub fn radar_config(&self) -> Result<RadarConfig, sonar_scan::ConfigError> {
        let config = RadarConfig {
            time_base: TimeBaseConfig {
                tick_period: Duration::from_millis(self.time_base.tick_period_ms),
                ticks_per_step: self.time_base.ticks_per_step,
            },
            sweep: SweepConfig {
                step: self.sweep.step_deg,
                min_angle: self.sweep.min_deg,
                max_angle: self.sweep.max_deg,
                park_angle: self.sweep.park_deg,
            },
            servo: ServoMapping {
                base_offset: self.servo.base_offset_us,
                scale: self.servo.us_per_deg,
                frame: self.servo.frame_us,
            },
            sensor: SensorConfig {
                trigger_pulse: Duration::from_micros(self.sensor.trigger_pulse_us),
                rise_timeout: Duration::from_micros(self.sensor.rise_timeout_us),
                fall_timeout: Duration::from_micros(self.sensor.fall_timeout_us),
                poll_interval: Duration::from_nanos(self.sensor.poll_interval_ns),
                counts_per_unit: self.sensor.counts_per_cm,
            },
            scan: ScanConfig {
                threshold: self.scan.threshold_cm,
                settle: Duration::from_millis(self.scan.settle_ms),
                step_poll: Duration::from_micros(self.scan.step_poll_us),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Build the simulated room for the given servo mapping.
    pub fn world(&self, mapping: ServoMapping) -> World {
        let targets = self
            .world
            .targets
            .iter()
            .map(|t| Target {
                bearing: t.bearing_deg,
                half_width: t.half_width_deg,
                distance_cm: t.distance_cm,
            })
            .collect();
        let acoustics = Acoustics {
            rise_latency: Duration::from_micros(self.world.rise_latency_us),
            round_trip_per_cm: Duration::from_micros(self.world.round_trip_us_per_cm),
        };
        World::new(targets, acoustics, mapping)
    }
}

/// Load settings from `$SONAR_CONFIG` (or `config/default.toml`) if present,
/// then apply `SONAR__SECTION__KEY` environment overrides.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    info!("Attempting to load configuration from {}", path);

    let settings = Config::builder()
        .add_source(File::new(&path, FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|config| config.try_deserialize::<Settings>());

    match settings {
        Ok(settings) => {
            info!("Successfully loaded configuration: {:?}", settings);
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

/// Parse settings from TOML text, without environment overrides.
pub fn settings_from_toml(text: &str) -> Result<Settings, ConfigError> {
    Config::builder()
        .add_source(File::from_str(text, FileFormat::Toml))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_match_reference_config() {
        let config = Settings::default().radar_config().unwrap();
        assert_eq!(config, RadarConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = settings_from_toml(
            r#"
            [scan]
            threshold_cm = 30

            [sweep]
            step_deg = 15
            "#,
        )
        .unwrap();

        let config = settings.radar_config().unwrap();
        assert_eq!(config.scan.threshold, 30);
        assert_eq!(config.sweep.step, 15);
        assert_eq!(config.sweep.max_angle, 180);
        assert_eq!(config.sensor, SensorConfig::default());
        assert_eq!(settings.output.baud_rate, 9600);
    }

    #[test]
    fn test_world_targets_parsed() {
        let settings = settings_from_toml(
            r#"
            [[world.targets]]
            bearing_deg = 40
            half_width_deg = 5
            distance_cm = 30

            [[world.targets]]
            bearing_deg = 120
            distance_cm = 80
            "#,
        )
        .unwrap();

        let world = settings.world(ServoMapping::default());
        assert_eq!(world.targets.len(), 2);
        assert_eq!(world.targets[1].half_width, 0);
        assert_eq!(world.acoustics, Acoustics::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let settings = settings_from_toml(
            r#"
            [time_base]
            ticks_per_step = 0
            "#,
        )
        .unwrap();
        assert_eq!(
            settings.radar_config(),
            Err(sonar_scan::ConfigError::ZeroTicksPerStep)
        );
    }

    #[test]
    fn test_shipped_config_file_is_valid() {
        let text = include_str!("../config/default.toml");
        let settings = settings_from_toml(text).unwrap();
        assert!(settings.radar_config().is_ok());
        assert!(!settings.world.targets.is_empty());
    }
}
