//! Rendering collaborators.
//!
//! The scheduler decides *when* clicks happen; a [`ClickOutput`] turns them
//! into sound. Implementations must not block: events are fire-and-forget.

#[cfg(feature = "rtrb")]
pub mod device;
pub mod offline;
pub mod renderer;
pub mod voice;

#[cfg(feature = "rtrb")]
pub use device::CpalOutput;
pub use offline::OfflineOutput;
pub use renderer::{ClickCommand, ClickRenderer};
pub use voice::ClickVoice;

use crate::sequencing::ScheduledEvent;

/// Availability of the output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    /// Never acquired (or acquisition failed). Scheduling is skipped.
    Unavailable,
    /// Acquired but paused; its clock does not advance until resumed.
    Suspended,
    Running,
}

/// What the metronome needs from the audio side.
pub trait ClickOutput: Send {
    /// Lazily acquire the device. Idempotent; returns whether it is usable.
    fn ensure_output_ready(&mut self) -> bool;

    fn output_state(&self) -> OutputState;

    fn resume_output(&mut self);

    /// Schedule a click at `event.time` on the clock's timeline.
    fn render_event(&mut self, event: &ScheduledEvent);

    fn set_output_gain(&mut self, gain: f32);
}

/// Output that is always ready and discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl ClickOutput for NullOutput {
    fn ensure_output_ready(&mut self) -> bool {
        true
    }

    fn output_state(&self) -> OutputState {
        OutputState::Running
    }

    fn resume_output(&mut self) {}

    fn render_event(&mut self, _event: &ScheduledEvent) {}

    fn set_output_gain(&mut self, _gain: f32) {}
}

/// Output that keeps every event it is handed.
///
/// Starts unavailable when built with [`RecordingOutput::unavailable`] and
/// becomes ready on the first `ensure_output_ready` unless told to refuse.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub events: Vec<ScheduledEvent>,
    pub gain: f32,
    pub resume_count: usize,
    state: Option<OutputState>,
    refuse: bool,
}

impl RecordingOutput {
    /// Ready and running.
    pub fn new() -> Self {
        Self {
            gain: 1.0,
            state: Some(OutputState::Running),
            ..Self::default()
        }
    }

    /// Not yet acquired; the first `ensure_output_ready` succeeds.
    pub fn unavailable() -> Self {
        Self {
            gain: 1.0,
            ..Self::default()
        }
    }

    /// Never becomes available until [`allow`](Self::allow) is called.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::unavailable()
        }
    }

    pub fn allow(&mut self) {
        self.refuse = false;
    }

    pub fn suspend(&mut self) {
        if self.state.is_some() {
            self.state = Some(OutputState::Suspended);
        }
    }

    /// Beat times of everything recorded so far.
    pub fn times(&self) -> Vec<f64> {
        self.events.iter().map(|e| e.time).collect()
    }
}

impl ClickOutput for RecordingOutput {
    fn ensure_output_ready(&mut self) -> bool {
        if self.state.is_none() && !self.refuse {
            self.state = Some(OutputState::Running);
        }
        self.state.is_some()
    }

    fn output_state(&self) -> OutputState {
        self.state.unwrap_or(OutputState::Unavailable)
    }

    fn resume_output(&mut self) {
        if self.state == Some(OutputState::Suspended) {
            self.state = Some(OutputState::Running);
            self.resume_count += 1;
        }
    }

    fn render_event(&mut self, event: &ScheduledEvent) {
        self.events.push(*event);
    }

    fn set_output_gain(&mut self, gain: f32) {
        self.gain = gain;
    }
}
