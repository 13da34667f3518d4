//! Frame clock.
use std::{
    thread,
    time::{Duration, Instant},
};

const NANOS_IN_SECOND: u64 = 1_000_000_000;

/// Frequency in hertz (per second)
#[derive(Debug, Default, Clone, Copy)]
pub struct Hz(pub u64);

impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(NANOS_IN_SECOND / freq.0)
        }
    }
}

/// Timer to synchronize the host loop with the frame rate of the VM.
///
/// Time spent executing the frame counts towards the wait, so a frame
/// that took longer than the interval does not wait at all.
pub struct Clock {
    start: Instant,
    interval: Duration,
}

impl Clock {
    pub fn new(freq: Hz) -> Self {
        Self {
            start: Instant::now(),
            interval: freq.into(),
        }
    }

    /// Set the clock state back to zero.
    pub fn reset(&mut self) {
        self.start = Instant::now()
    }

    /// Block the current thread until the next frame.
    pub fn wait(&mut self) {
        while self.start.elapsed() < self.interval {
            // Sleep does not have enough resolution for a 60 Hz frame,
            // and spinning burns the CPU.
            thread::yield_now();
        }

        // Reset back to zero, rather than trying to catch up.
        self.reset();
    }
}
