//! `embedded-hal` pins backed by the simulated world.

use std::convert::Infallible;

use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use sonar_scan::Clock;

use super::world::Blackboard;

/// Ranger trigger line. The falling edge fires a ping.
pub struct SimTrigger<C> {
    bb: Blackboard,
    clock: C,
    high: bool,
}

impl<C: Clock> SimTrigger<C> {
    pub fn new(bb: Blackboard, clock: C) -> Self {
        Self {
            bb,
            clock,
            high: false,
        }
    }
}

impl<C> digital::ErrorType for SimTrigger<C> {
    type Error = Infallible;
}

impl<C: Clock> OutputPin for SimTrigger<C> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.high {
            self.bb.write().ping(self.clock.now());
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

/// Ranger echo line.
pub struct SimEcho<C> {
    bb: Blackboard,
    clock: C,
}

impl<C: Clock> SimEcho<C> {
    pub fn new(bb: Blackboard, clock: C) -> Self {
        Self { bb, clock }
    }
}

impl<C> digital::ErrorType for SimEcho<C> {
    type Error = Infallible;
}

impl<C: Clock> InputPin for SimEcho<C> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.bb.read().echo_high(self.clock.now()))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Servo PWM channel. The duty is the pulse width in µs of a one-frame period.
pub struct SimServo {
    bb: Blackboard,
    frame: u16,
}

impl SimServo {
    pub fn new(bb: Blackboard, frame: u16) -> Self {
        Self { bb, frame }
    }
}

impl pwm::ErrorType for SimServo {
    type Error = Infallible;
}

impl SetDutyCycle for SimServo {
    fn max_duty_cycle(&self) -> u16 {
        self.frame
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.bb.write().servo_pulse = Some(duty.min(self.frame));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::{Acoustics, Target, World, blackboard};
    use sonar_scan::{Instant, ManualClock, ServoMapping};
    use std::time::Duration;

    #[test]
    fn test_trigger_falling_edge_pings() {
        let clock = ManualClock::new();
        let bb = blackboard(World::new(
            vec![Target { bearing: 0, half_width: 0, distance_cm: 10 }],
            Acoustics::default(),
            ServoMapping::default(),
        ));
        let mut servo = SimServo::new(bb.clone(), 20_000);
        let mut trigger = SimTrigger::new(bb.clone(), clock.clone());
        let mut echo = SimEcho::new(bb.clone(), clock.clone());

        servo.set_duty_cycle(600).unwrap();
        // Low without a preceding high is not a pulse.
        trigger.set_low().unwrap();
        assert_eq!(bb.read().pings, 0);

        trigger.set_high().unwrap();
        clock.advance(Duration::from_micros(10));
        trigger.set_low().unwrap();
        assert_eq!(bb.read().pings, 1);

        assert!(echo.is_low().unwrap());
        clock.set(Instant::from_micros(10 + 200));
        assert!(echo.is_high().unwrap());
        clock.set(Instant::from_micros(10 + 200 + 580));
        assert!(echo.is_low().unwrap());
    }

    #[test]
    fn test_servo_duty_is_limited_to_frame() {
        let bb = blackboard(World::new(Vec::new(), Acoustics::default(), ServoMapping::default()));
        let mut servo = SimServo::new(bb.clone(), 20_000);
        assert_eq!(servo.max_duty_cycle(), 20_000);
        servo.set_duty_cycle(u16::MAX).unwrap();
        assert_eq!(bb.read().servo_pulse, Some(20_000));
    }
}
