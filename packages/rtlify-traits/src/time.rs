//! Monotonic time sources

use std::cell::Cell;
use std::time::{Duration, Instant};

/// A monotonic clock. The epoch is arbitrary but fixed for the lifetime of the clock.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to.
///
/// With a non-zero auto step, every call to [`Clock::now`] advances the clock by that step
/// after reading it, which lets tests simulate work that takes time.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
    auto_step: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock that advances by `step` on every read
    pub fn with_auto_step(step: Duration) -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            auto_step: Cell::new(step),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set_auto_step(&self, step: Duration) {
        self.auto_step.set(step);
    }

    /// Current time without triggering the auto step
    pub fn peek(&self) -> Duration {
        self.now.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let now = self.now.get();
        self.now.set(now + self.auto_step.get());
        now
    }
}
