use parking_lot::RwLock;
use std::{sync::Arc, time::Duration};

use sonar_scan::{Instant, ServoMapping};
use tracing::trace;

/// An object the simulated beam can hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    /// Angle of the object's center, in degrees.
    pub bearing: u16,
    /// Half of the angular width that still returns an echo.
    pub half_width: u16,
    /// Distance from the sensor in centimeters.
    pub distance_cm: u32,
}

impl Target {
    fn covers(&self, angle: u16) -> bool {
        angle.abs_diff(self.bearing) <= self.half_width
    }
}

/// How sound behaves in the simulated room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acoustics {
    /// Delay between the trigger falling and the echo line rising.
    pub rise_latency: Duration,
    /// Echo high time per centimeter of distance (out and back).
    pub round_trip_per_cm: Duration,
}

impl Default for Acoustics {
    fn default() -> Self {
        Self {
            rise_latency: Duration::from_micros(200),
            round_trip_per_cm: Duration::from_micros(58),
        }
    }
}

/// Shared state of the simulated hardware.
#[derive(Debug, Clone)]
pub struct World {
    pub targets: Vec<Target>,
    pub acoustics: Acoustics,
    pub mapping: ServoMapping,
    pub servo_pulse: Option<u16>,
    pub echo: Option<(Instant, Instant)>,
    pub pings: u64,
}

impl World {
    pub fn new(targets: Vec<Target>, acoustics: Acoustics, mapping: ServoMapping) -> Self {
        World {
            targets,
            acoustics,
            mapping,
            servo_pulse: None,
            echo: None,
            pings: 0,
        }
    }

    /// Angle the servo currently points at, from the last pulse written.
    pub fn servo_angle(&self) -> Option<u16> {
        let pulse = self.servo_pulse?;
        let scale = self.mapping.scale.max(1);
        Some(pulse.saturating_sub(self.mapping.base_offset) / scale)
    }

    /// Closest target in the beam at the current servo angle.
    pub fn target_in_beam(&self) -> Option<Target> {
        let angle = self.servo_angle()?;
        self.targets
            .iter()
            .filter(|t| t.covers(angle))
            .min_by_key(|t| t.distance_cm)
            .copied()
    }

    /// The trigger fell at `at`: schedule the echo for this ping.
    pub fn ping(&mut self, at: Instant) {
        self.pings += 1;
        self.echo = self.target_in_beam().map(|target| {
            let rise = at + self.acoustics.rise_latency;
            let fall = rise + self.acoustics.round_trip_per_cm * target.distance_cm;
            (rise, fall)
        });
        trace!(ping = self.pings, angle = ?self.servo_angle(), echo = ?self.echo, "Ping");
    }

    /// Level of the echo line at `now`.
    pub fn echo_high(&self, now: Instant) -> bool {
        matches!(self.echo, Some((rise, fall)) if now >= rise && now < fall)
    }
}

pub type Blackboard = Arc<RwLock<World>>;

pub fn blackboard(world: World) -> Blackboard {
    Arc::new(RwLock::new(world))
}

pub fn snapshot(bb: &Blackboard) -> World {
    (*bb.read()).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(
            vec![
                Target { bearing: 40, half_width: 5, distance_cm: 30 },
                Target { bearing: 45, half_width: 10, distance_cm: 20 },
                Target { bearing: 120, half_width: 0, distance_cm: 80 },
            ],
            Acoustics::default(),
            ServoMapping::default(),
        )
    }

    #[test]
    fn test_servo_angle_inverts_mapping() {
        let mut w = world();
        assert_eq!(w.servo_angle(), None);
        w.servo_pulse = Some(600);
        assert_eq!(w.servo_angle(), Some(0));
        w.servo_pulse = Some(1500);
        assert_eq!(w.servo_angle(), Some(90));
        w.servo_pulse = Some(2400);
        assert_eq!(w.servo_angle(), Some(180));
    }

    #[test]
    fn test_closest_target_wins() {
        let mut w = world();
        w.servo_pulse = Some(ServoMapping::default().command(40));
        assert_eq!(w.target_in_beam().map(|t| t.distance_cm), Some(20));
        w.servo_pulse = Some(ServoMapping::default().command(120));
        assert_eq!(w.target_in_beam().map(|t| t.distance_cm), Some(80));
        w.servo_pulse = Some(ServoMapping::default().command(121));
        assert_eq!(w.target_in_beam(), None);
    }

    #[test]
    fn test_ping_schedules_echo_window() {
        let mut w = world();
        w.servo_pulse = Some(ServoMapping::default().command(120));
        let t = Instant::from_micros(1_000);
        w.ping(t);

        assert!(!w.echo_high(t + Duration::from_micros(199)));
        assert!(w.echo_high(t + Duration::from_micros(200)));
        // 80 cm at 58 µs/cm.
        assert!(w.echo_high(t + Duration::from_micros(200 + 4_639)));
        assert!(!w.echo_high(t + Duration::from_micros(200 + 4_640)));
        assert_eq!(w.pings, 1);
    }

    #[test]
    fn test_ping_without_target_stays_silent() {
        let mut w = world();
        w.servo_pulse = Some(ServoMapping::default().command(170));
        w.ping(Instant::ZERO);
        assert_eq!(w.echo, None);
        assert!(!w.echo_high(Instant::from_micros(300)));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let bb = blackboard(world());
        let snap = snapshot(&bb);
        bb.write().servo_pulse = Some(600);
        assert_eq!(snap.servo_pulse, None);
    }
}
