use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use super::Clock;

/// Manually stepped clock for tests and offline rendering.
///
/// Clones share the same timeline, so a test can keep one handle while the
/// metronome owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    inner: Arc<ManualInner>,
}

#[derive(Debug, Default)]
struct ManualInner {
    /// Seconds stored as `f64` bits
    seconds: AtomicU64,
    suspended: AtomicBool,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock already positioned at `seconds`.
    pub fn starting_at(seconds: f64) -> Self {
        let clock = Self::new();
        clock.set(seconds);
        clock
    }

    /// Move the clock forward by `seconds`. Ignored while suspended.
    pub fn advance(&self, seconds: f64) {
        if seconds <= 0.0 || self.is_suspended() {
            return;
        }
        self.set(self.now() + seconds);
    }

    /// Jump to an absolute time. Never moves backwards.
    pub fn set(&self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        let _ = self
            .inner
            .seconds
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                (seconds > f64::from_bits(bits)).then_some(seconds.to_bits())
            });
    }

    /// Freeze the clock until [`Clock::resume`] is called.
    pub fn suspend(&self) {
        self.inner.suspended.store(true, Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.inner.seconds.load(Ordering::Acquire))
    }

    fn is_suspended(&self) -> bool {
        self.inner.suspended.load(Ordering::Acquire)
    }

    fn resume(&self) {
        self.inner.suspended.store(false, Ordering::Release);
    }
}
