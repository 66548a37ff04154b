use spin_sleep::SpinSleeper;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tracing::{info, warn};

use sonar_scan::TimeBase;

/// Thread standing in for the periodic timer interrupt.
pub struct TickDriver {
    handle: Option<JoinHandle<u64>>,
    running: Arc<AtomicBool>,
}

impl TickDriver {
    /// Call `on_tick` every `period` on a dedicated `timebase` thread.
    ///
    /// Deadlines are absolute, so a late wake-up does not shift later ticks.
    pub fn spawn(time_base: Arc<TimeBase>, period: Duration) -> std::io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let handle = thread::Builder::new().name("timebase".into()).spawn({
            let running = Arc::clone(&running);
            move || {
                info!(?period, "Time base thread started.");
                let sleeper = SpinSleeper::default();
                let mut deadline = Instant::now() + period;
                let mut ticks: u64 = 0;
                while running.load(Ordering::Acquire) {
                    sleeper.sleep(deadline.saturating_duration_since(Instant::now()));
                    time_base.on_tick();
                    ticks += 1;
                    deadline += period;
                }
                ticks
            }
        })?;

        Ok(Self {
            handle: Some(handle),
            running,
        })
    }

    /// Stop ticking and wait for the thread. Returns the number of ticks fired.
    pub fn stop(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        self.running.store(false, Ordering::Release);
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(ticks)) => ticks,
            Some(Err(_)) => {
                warn!("Time base thread panicked.");
                0
            }
            None => 0,
        }
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}
