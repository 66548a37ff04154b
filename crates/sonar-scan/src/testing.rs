//! Pin doubles shared by the unit tests.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

use crate::clock::{Clock, Instant, ManualClock};

/// Output pin logging every level change with its timestamp.
#[derive(Debug, Clone)]
pub struct RecordingPin {
    clock: ManualClock,
    edges: Arc<Mutex<Vec<(Instant, bool)>>>,
}

impl RecordingPin {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            edges: Arc::default(),
        }
    }

    pub fn edges(&self) -> Vec<(Instant, bool)> {
        self.edges.lock().unwrap().clone()
    }
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.edges.lock().unwrap().push((self.clock.now(), false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.edges.lock().unwrap().push((self.clock.now(), true));
        Ok(())
    }
}

/// Echo line that is high during a fixed window `[rise, fall)` of clock time.
#[derive(Debug, Clone)]
pub struct ScriptedEcho {
    clock: ManualClock,
    window: Arc<Mutex<Option<(Instant, Instant)>>>,
}

impl ScriptedEcho {
    pub fn new(clock: ManualClock, window: Option<(Instant, Instant)>) -> Self {
        Self {
            clock,
            window: Arc::new(Mutex::new(window)),
        }
    }

    pub fn set_window(&self, window: Option<(Instant, Instant)>) {
        *self.window.lock().unwrap() = window;
    }
}

impl ErrorType for ScriptedEcho {
    type Error = Infallible;
}

impl InputPin for ScriptedEcho {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let now = self.clock.now();
        Ok(match *self.window.lock().unwrap() {
            Some((rise, fall)) => now >= rise && now < fall,
            None => false,
        })
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Servo output keeping every duty written to it.
#[derive(Debug, Clone, Default)]
pub struct RecordingServo {
    duties: Arc<Mutex<Vec<u16>>>,
}

impl RecordingServo {
    pub fn duties(&self) -> Vec<u16> {
        self.duties.lock().unwrap().clone()
    }
}

impl pwm::ErrorType for RecordingServo {
    type Error = Infallible;
}

impl SetDutyCycle for RecordingServo {
    fn max_duty_cycle(&self) -> u16 {
        20_000
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duties.lock().unwrap().push(duty);
        Ok(())
    }
}
