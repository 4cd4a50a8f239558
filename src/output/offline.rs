use super::{renderer::ClickCommand, renderer::ClickRenderer, ClickOutput, OutputState};
use crate::{clock::ManualClock, sequencing::ScheduledEvent, MAX_BLOCK_SIZE};

/// Renders clicks into memory instead of a device.
///
/// The output owns the timeline: every call to [`render_frames`] advances
/// the shared [`ManualClock`] by exactly the frames rendered, the same way a
/// device's frame counter drives a stream clock. Hand a clone of
/// [`clock`](Self::clock) to the metronome.
///
/// [`render_frames`]: Self::render_frames
pub struct OfflineOutput {
    renderer: ClickRenderer,
    clock: ManualClock,
    sample_rate: u32,
    buffer: Vec<f32>,
    block: Vec<f32>,
    dropped: u64,
}

impl OfflineOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            renderer: ClickRenderer::new(sample_rate as f32),
            clock: ManualClock::new(),
            sample_rate,
            buffer: Vec::new(),
            block: vec![0.0; MAX_BLOCK_SIZE],
            dropped: 0,
        }
    }

    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Render `frames` more frames and advance the clock to match.
    pub fn render_frames(&mut self, frames: usize) {
        let mut remaining = frames;
        while remaining > 0 {
            let n = remaining.min(MAX_BLOCK_SIZE);
            let block = &mut self.block[..n];
            self.renderer.render(block);
            self.buffer.extend_from_slice(block);
            remaining -= n;
        }
        self.clock
            .set(self.renderer.position() as f64 / self.sample_rate as f64);
    }

    /// Everything rendered so far (mono).
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    /// Clicks lost because the pending queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl ClickOutput for OfflineOutput {
    fn ensure_output_ready(&mut self) -> bool {
        true
    }

    fn output_state(&self) -> OutputState {
        OutputState::Running
    }

    fn resume_output(&mut self) {}

    fn render_event(&mut self, event: &ScheduledEvent) {
        let command = ClickCommand::at_time(event.time, f64::from(self.sample_rate), event.accent);
        if !self.renderer.queue(command) {
            self.dropped += 1;
        }
    }

    fn set_output_gain(&mut self, gain: f32) {
        self.renderer.set_gain(gain);
    }
}
