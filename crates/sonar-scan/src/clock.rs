//! Time source behind every bounded wait in the scanner.
//!
//! The sensor timeouts, the settle delay and the step poll are all expressed
//! as [`Duration`]s measured against a [`Clock`], so the same code runs on a
//! real timer or on a [`ManualClock`] that only moves when told to.

use core::fmt;
use core::ops::{Add, AddAssign, Sub};
use core::time::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A point in time, in nanoseconds since the owning clock's origin.
#[derive(Clone, Copy, Eq, Ord, PartialEq, PartialOrd, Debug, Default, Hash)]
pub struct Instant(u64);

impl Instant {
    /// The clock origin.
    pub const ZERO: Instant = Instant(0);

    /// Construct an instant from nanoseconds since the origin.
    pub const fn from_nanos(nanos: u64) -> Self {
        Instant(nanos)
    }

    /// Construct an instant from microseconds since the origin.
    pub const fn from_micros(micros: u64) -> Self {
        Instant(micros * 1_000)
    }

    /// Nanoseconds since the origin.
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, or zero if `earlier` is later.
    pub fn saturating_duration_since(self, earlier: Instant) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}ns", self.0)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Self::Output {
        Instant(self.0.saturating_add(duration_nanos(rhs)))
    }
}

impl AddAssign<Duration> for Instant {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl Sub for Instant {
    type Output = Option<Duration>;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.0 >= rhs.0 {
            Some(Duration::from_nanos(self.0 - rhs.0))
        } else {
            None
        }
    }
}

fn duration_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Monotonic time source with a blocking hold.
pub trait Clock {
    /// Current time.
    fn now(&self) -> Instant;

    /// Block for at least `duration`.
    ///
    /// The default busy-waits on [`Clock::now`]. Implementations backed by a
    /// better primitive (a spin-sleeper, a simulated clock) override it.
    fn hold(&self, duration: Duration) {
        let start = self.now();
        while self.now().saturating_duration_since(start) < duration {
            core::hint::spin_loop();
        }
    }

    /// Time elapsed since `start`.
    fn elapsed_since(&self, start: Instant) -> Duration {
        self.now().saturating_duration_since(start)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn hold(&self, duration: Duration) {
        (**self).hold(duration)
    }
}

/// A clock that only advances through [`ManualClock::advance`] or
/// [`Clock::hold`].
///
/// Clones share the same time, so simulated hardware can read the instant the
/// code under test is holding on.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// A clock sitting at [`Instant::ZERO`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.nanos.fetch_add(duration_nanos(duration), Ordering::AcqRel);
    }

    /// Jump to `instant`.
    pub fn set(&self, instant: Instant) {
        self.nanos.store(instant.as_nanos(), Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        Instant(self.nanos.load(Ordering::Acquire))
    }

    fn hold(&self, duration: Duration) {
        self.advance(duration);
    }
}
