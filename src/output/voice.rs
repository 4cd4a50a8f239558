use std::f32::consts::TAU;

use crate::MIN_TIME;

/*
Click Voice
===========

A metronome click is a very short pitched blip: a sine burst shaped by a
percussive envelope. There is no sustain and no note-off; once triggered the
voice runs to silence on its own.

  Level
    1.0 ┐ ╱╲
        │╱  ╲
        │    ╲
        │     ╲
    0.0 └──────╲────→ Time
        A   Decay

Accented (downbeat) clicks use a higher pitch and a louder peak so the start
of each measure stands out.

The envelope is linear, like the synth envelopes: per-sample increments are
derived from the stage duration,

    increment = 1.0 / (time_seconds * sample_rate)

so a 1ms attack at 48kHz ramps over 48 samples.
*/

/// Accented click pitch (Hz)
pub const ACCENT_FREQUENCY: f32 = 1500.0;
/// Regular click pitch (Hz)
pub const REGULAR_FREQUENCY: f32 = 1000.0;
/// Peak level of a regular click relative to an accent
pub const REGULAR_LEVEL: f32 = 0.6;

const ATTACK_TIME: f32 = 0.001;
const DECAY_TIME: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Attack,
    Decay,
}

/// Attack/decay envelope with no sustain.
#[derive(Debug, Clone)]
struct ClickEnvelope {
    attack_time: f32,
    decay_time: f32,
    stage: Stage,
    level: f32,
}

impl ClickEnvelope {
    fn new(attack_time: f32, decay_time: f32) -> Self {
        Self {
            attack_time: attack_time.max(MIN_TIME),
            decay_time: decay_time.max(MIN_TIME),
            stage: Stage::Idle,
            level: 0.0,
        }
    }

    /// Restart from zero so back-to-back clicks stay distinct.
    fn trigger(&mut self) {
        self.level = 0.0;
        self.stage = Stage::Attack;
    }

    fn next_sample(&mut self, sample_rate: f32) -> f32 {
        match self.stage {
            Stage::Idle => self.level = 0.0,
            Stage::Attack => {
                self.level += 1.0 / (self.attack_time * sample_rate);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                self.level -= 1.0 / (self.decay_time * sample_rate);
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                }
            }
        }
        self.level
    }

    fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }
}

/// One click voice: sine oscillator times percussive envelope.
#[derive(Debug, Clone)]
pub struct ClickVoice {
    sample_rate: f32,
    frequency: f32,
    peak: f32,
    phase: f32,
    envelope: ClickEnvelope,
    /// Frames rendered since the last trigger (for voice stealing)
    age: u64,
}

impl ClickVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            frequency: REGULAR_FREQUENCY,
            peak: REGULAR_LEVEL,
            phase: 0.0,
            envelope: ClickEnvelope::new(ATTACK_TIME, DECAY_TIME),
            age: 0,
        }
    }

    /// Start a click. Accents are higher and louder.
    pub fn trigger(&mut self, accent: bool) {
        if accent {
            self.frequency = ACCENT_FREQUENCY;
            self.peak = 1.0;
        } else {
            self.frequency = REGULAR_FREQUENCY;
            self.peak = REGULAR_LEVEL;
        }
        self.phase = 0.0;
        self.age = 0;
        self.envelope.trigger();
    }

    /// Mix this voice into `out` (adds, does not overwrite).
    pub fn render_block(&mut self, out: &mut [f32]) {
        if !self.envelope.is_active() {
            return;
        }

        let increment = TAU * self.frequency / self.sample_rate;
        for sample in out.iter_mut() {
            let level = self.envelope.next_sample(self.sample_rate);
            *sample += self.phase.sin() * level * self.peak;

            self.phase += increment;
            if self.phase >= TAU {
                self.phase -= TAU;
            }
        }
        self.age += out.len() as u64;
    }

    /// Still producing sound
    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    pub fn age(&self) -> u64 {
        self.age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn peak(buffer: &[f32]) -> f32 {
        buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    #[test]
    fn idle_voice_renders_nothing() {
        let mut voice = ClickVoice::new(SAMPLE_RATE);
        let mut buffer = vec![0.0; 256];
        voice.render_block(&mut buffer);
        assert!(buffer.iter().all(|&s| s == 0.0));
        assert!(!voice.is_active());
    }

    #[test]
    fn click_decays_to_silence() {
        let mut voice = ClickVoice::new(SAMPLE_RATE);
        voice.trigger(false);

        let click_frames = ((ATTACK_TIME + DECAY_TIME) * SAMPLE_RATE) as usize + 16;
        let mut buffer = vec![0.0; click_frames];
        voice.render_block(&mut buffer);

        assert!(peak(&buffer) > 0.1);
        assert!(!voice.is_active());

        let mut tail = vec![0.0; 64];
        voice.render_block(&mut tail);
        assert_eq!(peak(&tail), 0.0);
    }

    #[test]
    fn accent_is_louder_than_regular_click() {
        let frames = 2048;

        let mut accent = ClickVoice::new(SAMPLE_RATE);
        accent.trigger(true);
        let mut accent_buf = vec![0.0; frames];
        accent.render_block(&mut accent_buf);

        let mut regular = ClickVoice::new(SAMPLE_RATE);
        regular.trigger(false);
        let mut regular_buf = vec![0.0; frames];
        regular.render_block(&mut regular_buf);

        assert!(peak(&accent_buf) > peak(&regular_buf));
        assert!(peak(&accent_buf) <= 1.0);
    }

    #[test]
    fn render_mixes_into_existing_signal() {
        let mut voice = ClickVoice::new(SAMPLE_RATE);
        voice.trigger(true);

        let mut buffer = vec![0.25; 128];
        voice.render_block(&mut buffer);
        // First sample: phase 0, so only the existing signal remains.
        assert_eq!(buffer[0], 0.25);
        assert!(buffer.iter().any(|&s| (s - 0.25).abs() > 1e-3));
    }
}
