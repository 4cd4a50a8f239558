use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{ClickError, Result},
    sequencing::MAX_TEMPO_BPM,
};

/// Startup configuration for a [`Metronome`](crate::Metronome).
///
/// Timing fields are fixed for the metronome's lifetime; `bpm`,
/// `beats_per_measure` and `volume` are only initial values and can be
/// changed live afterwards.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct MetronomeConfig {
    /// How far past the clock each trigger firing schedules beats.
    pub lookahead: Duration,
    /// How often the trigger fires. Must be shorter than `lookahead`.
    pub trigger_period: Duration,
    /// Delay before a manual [`click_once`](crate::Metronome::click_once).
    pub click_once_delay: Duration,
    pub bpm: f64,
    pub beats_per_measure: u32,
    pub volume: f32,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            lookahead: Duration::from_millis(100),
            trigger_period: Duration::from_millis(25),
            click_once_delay: Duration::from_millis(10),
            bpm: 120.0,
            beats_per_measure: 4,
            volume: 0.5,
        }
    }
}

impl MetronomeConfig {
    pub fn with_lookahead(mut self, lookahead: Duration) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn with_trigger_period(mut self, period: Duration) -> Self {
        self.trigger_period = period;
        self
    }

    pub fn with_click_once_delay(mut self, delay: Duration) -> Self {
        self.click_once_delay = delay;
        self
    }

    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn with_beats_per_measure(mut self, beats: u32) -> Self {
        self.beats_per_measure = beats;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Check the invariants the scheduler relies on.
    ///
    /// The horizon must be strictly wider than the trigger period, otherwise
    /// a beat can fall between two firings and be scheduled late.
    pub fn validate(&self) -> Result<()> {
        if self.trigger_period.is_zero() {
            return Err(ClickError::InvalidConfig("trigger period must be positive"));
        }
        if self.lookahead <= self.trigger_period {
            return Err(ClickError::InvalidConfig(
                "look-ahead horizon must be longer than the trigger period",
            ));
        }
        if !(self.bpm > 0.0 && self.bpm <= MAX_TEMPO_BPM) {
            return Err(ClickError::InvalidConfig("bpm must be within (0, 60000]"));
        }
        if self.beats_per_measure < 1 {
            return Err(ClickError::InvalidConfig("beats per measure must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(ClickError::InvalidConfig("volume must be within 0..=1"));
        }
        Ok(())
    }
}
