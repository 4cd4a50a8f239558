use std::sync::{
    atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
    Arc,
};

use super::Clock;

/// Clock driven by the frames an output stream has rendered.
///
/// The audio callback bumps the frame counter after every buffer, so `now()`
/// advances in buffer-sized steps and stops while the stream is paused.
/// Before a sample rate is known the clock reads `0.0`.
#[derive(Debug, Clone, Default)]
pub struct StreamClock {
    timeline: Arc<StreamTimeline>,
}

#[derive(Debug, Default)]
struct StreamTimeline {
    frames: AtomicU64,
    sample_rate: AtomicU32,
    suspended: AtomicBool,
}

impl StreamClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample rate of the stream, or 0 if no stream has been opened.
    pub fn sample_rate(&self) -> u32 {
        self.timeline.sample_rate.load(Ordering::Acquire)
    }

    /// Total frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.timeline.frames.load(Ordering::Acquire)
    }

    pub(crate) fn set_sample_rate(&self, sample_rate: u32) {
        self.timeline.sample_rate.store(sample_rate, Ordering::Release);
    }

    pub(crate) fn advance_frames(&self, frames: u64) {
        self.timeline.frames.fetch_add(frames, Ordering::AcqRel);
    }

    pub(crate) fn set_suspended(&self, suspended: bool) {
        self.timeline.suspended.store(suspended, Ordering::Release);
    }
}

impl Clock for StreamClock {
    fn now(&self) -> f64 {
        let sample_rate = self.sample_rate();
        if sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / sample_rate as f64
    }

    fn is_suspended(&self) -> bool {
        self.timeline.suspended.load(Ordering::Acquire)
    }

    // Resuming is done by the owning output, which restarts the stream.
}
