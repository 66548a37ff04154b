use spin_sleep::SpinSleeper;
use std::time::{Duration, Instant as StdInstant};

use sonar_scan::{Clock, Instant};

/// Host monotonic clock. Holds are served by a spin-sleeper so microsecond
/// waits stay accurate.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: StdInstant,
    sleeper: SpinSleeper,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: StdInstant::now(),
            sleeper: SpinSleeper::default(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        let nanos = self.origin.elapsed().as_nanos();
        Instant::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    fn hold(&self, duration: Duration) {
        if !duration.is_zero() {
            self.sleeper.sleep(duration);
        }
    }
}
