//! Tick time base and the step-ready flag it raises.
//!
//! [`TimeBase::on_tick`] is the body of the periodic timer interrupt. It is the
//! only writer of the tick counter and the only setter of the [`StepSignal`];
//! the scan loop is the only consumer. Both sides touch nothing but atomics.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use core::time::Duration;

/// Single-producer/single-consumer "step ready" flag.
///
/// Raising an already raised flag is a no-op, so ticks that arrive while the
/// consumer is busy coalesce instead of queueing.
#[derive(Debug, Default)]
pub struct StepSignal {
    ready: AtomicBool,
}

impl StepSignal {
    /// A lowered flag.
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
        }
    }

    /// Set the flag. Called from the tick context.
    pub fn raise(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Clear the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.ready.swap(false, Ordering::AcqRel)
    }

    /// Whether the flag is set, without clearing it.
    pub fn is_raised(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

/// Tick cadence of the time base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBaseConfig {
    /// Period between two timer ticks.
    pub tick_period: Duration,
    /// Ticks that make up one scan step.
    pub ticks_per_step: u32,
}

impl TimeBaseConfig {
    /// Wall-clock length of one scan step.
    pub fn step_period(&self) -> Duration {
        self.tick_period * self.ticks_per_step
    }
}

impl Default for TimeBaseConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(20),
            ticks_per_step: 25,
        }
    }
}

/// Tick counter plus the step signal it raises every `ticks_per_step` ticks.
#[derive(Debug)]
pub struct TimeBase {
    ticks: AtomicU32,
    ticks_per_step: u32,
    signal: StepSignal,
}

impl TimeBase {
    /// A time base raising its signal every `ticks_per_step` ticks.
    ///
    /// `ticks_per_step` of zero is treated as one.
    pub const fn new(ticks_per_step: u32) -> Self {
        Self {
            ticks: AtomicU32::new(0),
            ticks_per_step: if ticks_per_step == 0 { 1 } else { ticks_per_step },
            signal: StepSignal::new(),
        }
    }

    /// Advance by one tick. Never blocks.
    pub fn on_tick(&self) {
        // Single writer: a plain load/store pair is enough.
        let next = self.ticks.load(Ordering::Relaxed) + 1;
        if next >= self.ticks_per_step {
            self.ticks.store(0, Ordering::Relaxed);
            self.signal.raise();
        } else {
            self.ticks.store(next, Ordering::Relaxed);
        }
    }

    /// Current tick count, always in `[0, ticks_per_step)`.
    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Ticks per scan step.
    pub fn ticks_per_step(&self) -> u32 {
        self.ticks_per_step
    }

    /// The step-ready flag consumed by the scan loop.
    pub fn signal(&self) -> &StepSignal {
        &self.signal
    }
}

impl From<TimeBaseConfig> for TimeBase {
    fn from(config: TimeBaseConfig) -> Self {
        TimeBase::new(config.ticks_per_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_raised_after_full_step() {
        let tb = TimeBase::new(25);
        for _ in 0..24 {
            tb.on_tick();
        }
        assert!(!tb.signal().is_raised());
        assert_eq!(tb.ticks(), 24);

        tb.on_tick();
        assert!(tb.signal().is_raised());
        assert_eq!(tb.ticks(), 0);
    }

    #[test]
    fn test_take_clears_signal() {
        let tb = TimeBase::new(1);
        tb.on_tick();
        assert!(tb.signal().take());
        assert!(!tb.signal().take());
    }

    #[test]
    fn test_unconsumed_steps_coalesce() {
        let tb = TimeBase::new(25);
        // Three full steps elapse while the consumer is busy.
        for _ in 0..75 {
            tb.on_tick();
        }
        assert!(tb.signal().take());
        assert!(!tb.signal().take());
    }

    #[test]
    fn test_counter_stays_below_threshold() {
        let tb = TimeBase::new(7);
        for _ in 0..100 {
            tb.on_tick();
            assert!(tb.ticks() < tb.ticks_per_step());
        }
    }

    #[test]
    fn test_zero_ticks_per_step_fires_every_tick() {
        let tb = TimeBase::new(0);
        tb.on_tick();
        assert!(tb.signal().take());
    }

    #[test]
    fn test_reference_step_period() {
        assert_eq!(TimeBaseConfig::default().step_period(), Duration::from_millis(500));
    }
}
