use super::voice::ClickVoice;

/// Number of overlapping clicks a renderer can play at once
pub const MAX_VOICES: usize = 4;
/// Clicks that may be waiting for their frame
pub const MAX_PENDING: usize = 256;

/// A click pinned to an absolute frame of the output timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickCommand {
    pub frame: u64,
    pub accent: bool,
}

impl ClickCommand {
    /// Map an absolute time in seconds to the nearest frame.
    pub fn at_time(time: f64, sample_rate: f64, accent: bool) -> Self {
        let frame = (time * sample_rate).round().max(0.0) as u64;
        Self { frame, accent }
    }
}

/// Turns frame-stamped click commands into audio, block by block.
///
/// The renderer keeps its own frame position, which must advance in lockstep
/// with the clock the scheduler reads. A click lands on its exact frame when
/// that frame falls inside the block being rendered; a click whose frame has
/// already passed starts at the beginning of the next block. Past-due clicks
/// that would start on the same frame are merged into one (accented if any
/// of them is), and the mix is clamped to full scale before gain.
///
/// Realtime-safe: no allocation after construction.
pub struct ClickRenderer {
    voices: Vec<ClickVoice>,
    pending: Vec<ClickCommand>,
    gain: f32,
    position: u64,
}

impl ClickRenderer {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: (0..MAX_VOICES).map(|_| ClickVoice::new(sample_rate)).collect(),
            pending: Vec::with_capacity(MAX_PENDING),
            gain: 1.0,
            position: 0,
        }
    }

    /// Queue a click. Returns `false` (and drops it) when the queue is full.
    pub fn queue(&mut self, command: ClickCommand) -> bool {
        if self.pending.len() == MAX_PENDING {
            return false;
        }
        self.pending.push(command);
        true
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    /// Absolute frame of the next sample to be rendered.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Render the next `out.len()` frames, overwriting `out`.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);

        let start = self.position;
        let end = start + out.len() as u64;
        let mut cursor = 0;
        // Voice started at the current cursor, if any
        let mut onset: Option<usize> = None;

        while let Some(index) = self.next_due(end) {
            let command = self.pending.swap_remove(index);
            let offset = (command.frame.saturating_sub(start) as usize).max(cursor);

            // Late clicks all land on the cursor; stacking them in phase
            // would only make one louder click, so merge them.
            if offset == cursor {
                if let Some(voice) = onset {
                    if command.accent {
                        self.voices[voice].trigger(true);
                    }
                    continue;
                }
            }

            self.render_voices(&mut out[cursor..offset]);
            cursor = offset;
            let voice = self.allocate_voice();
            self.voices[voice].trigger(command.accent);
            onset = Some(voice);
        }
        self.render_voices(&mut out[cursor..]);

        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0) * self.gain;
        }

        self.position = end;
    }

    /// Earliest pending command whose frame is before `end`.
    fn next_due(&self, end: u64) -> Option<usize> {
        self.pending
            .iter()
            .enumerate()
            .filter(|(_, c)| c.frame < end)
            .min_by_key(|(_, c)| c.frame)
            .map(|(index, _)| index)
    }

    fn render_voices(&mut self, out: &mut [f32]) {
        if out.is_empty() {
            return;
        }
        for voice in self.voices.iter_mut().filter(|v| v.is_active()) {
            voice.render_block(out);
        }
    }

    /// Free voice first, otherwise steal the oldest.
    fn allocate_voice(&mut self) -> usize {
        self.voices
            .iter()
            .position(|v| !v.is_active())
            .or_else(|| {
                self.voices
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, v)| v.age())
                    .map(|(index, _)| index)
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn first_sound(buffer: &[f32]) -> Option<usize> {
        buffer.iter().position(|s| s.abs() > 0.0)
    }

    #[test]
    fn converts_time_to_nearest_frame() {
        assert_eq!(ClickCommand::at_time(0.5, 48_000.0, true).frame, 24_000);
        assert_eq!(ClickCommand::at_time(1.0 / 96_000.0, 48_000.0, false).frame, 1);
        assert_eq!(ClickCommand::at_time(-1.0, 48_000.0, false).frame, 0);
    }

    #[test]
    fn click_starts_on_its_frame_inside_the_block() {
        let mut renderer = ClickRenderer::new(SAMPLE_RATE);
        renderer.queue(ClickCommand {
            frame: 100,
            accent: true,
        });

        let mut block = vec![0.0; 512];
        renderer.render(&mut block);

        // The sine starts at phase zero, so the first audible sample is one later.
        assert_eq!(first_sound(&block), Some(101));
        assert_eq!(renderer.pending(), 0);
    }

    #[test]
    fn future_clicks_wait_for_their_block() {
        let mut renderer = ClickRenderer::new(SAMPLE_RATE);
        renderer.queue(ClickCommand {
            frame: 600,
            accent: false,
        });

        let mut block = vec![0.0; 512];
        renderer.render(&mut block);
        assert_eq!(first_sound(&block), None);
        assert_eq!(renderer.pending(), 1);

        renderer.render(&mut block);
        assert_eq!(first_sound(&block), Some(600 - 512 + 1));
        assert_eq!(renderer.position(), 1024);
    }

    #[test]
    fn late_clicks_start_immediately() {
        let mut renderer = ClickRenderer::new(SAMPLE_RATE);
        let mut block = vec![0.0; 256];
        renderer.render(&mut block);

        renderer.queue(ClickCommand {
            frame: 10,
            accent: true,
        });
        renderer.render(&mut block);
        assert_eq!(first_sound(&block), Some(1));
    }

    #[test]
    fn gain_scales_output() {
        let mut loud = ClickRenderer::new(SAMPLE_RATE);
        let mut quiet = ClickRenderer::new(SAMPLE_RATE);
        quiet.set_gain(0.5);

        let click = ClickCommand {
            frame: 0,
            accent: true,
        };
        loud.queue(click);
        quiet.queue(click);

        let mut a = vec![0.0; 256];
        let mut b = vec![0.0; 256];
        loud.render(&mut a);
        quiet.render(&mut b);

        for (x, y) in a.iter().zip(&b) {
            assert!((x * 0.5 - y).abs() < 1e-6);
        }
    }

    #[test]
    fn full_queue_drops_clicks() {
        let mut renderer = ClickRenderer::new(SAMPLE_RATE);
        for frame in 0..MAX_PENDING as u64 {
            assert!(renderer.queue(ClickCommand {
                frame: frame + 10_000,
                accent: false,
            }));
        }
        assert!(!renderer.queue(ClickCommand {
            frame: 0,
            accent: true,
        }));
    }

    #[test]
    fn late_clicks_on_the_same_frame_merge() {
        let mut single = ClickRenderer::new(SAMPLE_RATE);
        let mut stalled = ClickRenderer::new(SAMPLE_RATE);
        let mut block = vec![0.0; 256];
        single.render(&mut block);
        stalled.render(&mut block);

        // A stall leaves several past-due clicks; all would start at frame 0.
        single.queue(ClickCommand {
            frame: 10,
            accent: true,
        });
        for frame in [10, 40, 70, 100] {
            stalled.queue(ClickCommand {
                frame,
                accent: frame == 40,
            });
        }

        let mut a = vec![0.0; 256];
        let mut b = vec![0.0; 256];
        single.render(&mut a);
        stalled.render(&mut b);
        assert_eq!(a, b);
        assert_eq!(stalled.pending(), 0);
    }

    #[test]
    fn overlapping_clicks_stay_within_full_scale() {
        let mut renderer = ClickRenderer::new(SAMPLE_RATE);
        for frame in 100..100 + MAX_VOICES as u64 {
            renderer.queue(ClickCommand {
                frame,
                accent: true,
            });
        }

        let mut block = vec![0.0; 512];
        renderer.render(&mut block);
        assert!(block.iter().all(|s| s.abs() <= 1.0));
        assert!(block.iter().any(|s| s.abs() > 0.9));
    }
}
