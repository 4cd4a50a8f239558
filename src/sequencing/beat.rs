use super::tempo::TempoConfig;

/// Look-ahead cursor of a running scheduler.
///
/// `next_event_time` is absolute, on the clock's timeline. It only ever moves
/// by adding one beat duration to the previous target, never by re-reading the
/// clock, so trigger jitter cannot accumulate into tempo drift.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerState {
    pub next_event_time: f64,
    pub beat_index: u32,
}

impl SchedulerState {
    /// Fresh start: beat 0 at `now`.
    pub fn at(now: f64) -> Self {
        Self {
            next_event_time: now,
            beat_index: 0,
        }
    }
}

/// A click handed to the output. Transient: nothing keeps it after rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduledEvent {
    /// Absolute time on the clock's timeline, in seconds
    pub time: f64,
    /// First beat of the measure
    pub accent: bool,
    /// Position in the measure. Normally below the live `beats_per_measure`,
    /// but the beat right after the meter shrinks keeps the index computed
    /// under the old meter (it can be >= the new one); the next beat wraps.
    pub beat_index: u32,
}

/// Pure beat stepping.
pub struct BeatSequencer;

impl BeatSequencer {
    /// Emit the beat at `state` and compute the state for the beat after it.
    ///
    /// `seconds_per_beat` and `beats_per_measure` are whatever is live at the
    /// time of the call, so a tempo or meter change lands on the very next
    /// beat and never rewrites the one being emitted.
    pub fn advance(
        state: SchedulerState,
        seconds_per_beat: f64,
        beats_per_measure: u32,
    ) -> (SchedulerState, ScheduledEvent) {
        let beats_per_measure = beats_per_measure.max(1);

        let event = ScheduledEvent {
            time: state.next_event_time,
            accent: state.beat_index % beats_per_measure == 0,
            beat_index: state.beat_index,
        };

        let next = SchedulerState {
            next_event_time: state.next_event_time + seconds_per_beat,
            beat_index: (state.beat_index + 1) % beats_per_measure,
        };

        (next, event)
    }

    /// [`advance`](Self::advance) reading the live configuration.
    pub fn advance_with(
        state: SchedulerState,
        tempo: &TempoConfig,
    ) -> (SchedulerState, ScheduledEvent) {
        Self::advance(state, tempo.seconds_per_beat(), tempo.beats_per_measure())
    }
}
