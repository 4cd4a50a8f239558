use std::time::Duration;

use log::{debug, trace, warn};

use crate::{
    output::{ClickOutput, OutputState},
    sequencing::{BeatSequencer, SchedulerState, TempoConfig},
};

/*
Look-ahead Scheduling
=====================

Two clocks are in play:

  trigger   coarse and jittery (a timer thread, every ~25ms, sometimes late)
  output    sample-accurate (the audio device's frame counter)

Clicks are never played "when the trigger fires". Each firing instead looks
a short distance into the future and hands every beat that falls inside that
window to the output with its exact timestamp:

    now                      now + horizon
     |===========================|
     |    x         x         x  |     x
          ^ beats already handed over, skipped next time
                                       ^ picked up by a later firing

    while next_event_time < now + horizon:
        emit(next beat); next_event_time += seconds_per_beat

Consequences:
  - A late firing still lands every beat on time, as long as the horizon is
    wider than the trigger period.
  - A stalled trigger (more than a beat) drains every missed beat in one go,
    in order. Nothing is skipped.
  - `next_event_time` only grows by whole beat durations, so timer jitter
    never turns into tempo drift.
*/

/// Scheduler lifecycle. The look-ahead cursor only exists while running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transport {
    Stopped,
    Running(SchedulerState),
}

/// The drain loop and its state machine.
#[derive(Debug)]
pub struct LookaheadScheduler {
    transport: Transport,
    horizon: f64,
}

impl LookaheadScheduler {
    pub fn new(horizon: Duration) -> Self {
        Self {
            transport: Transport::Stopped,
            horizon: horizon.as_secs_f64(),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.transport, Transport::Running(_))
    }

    /// Current look-ahead cursor, if running.
    pub fn state(&self) -> Option<SchedulerState> {
        match self.transport {
            Transport::Running(state) => Some(state),
            Transport::Stopped => None,
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Start fresh on beat 0 at `now`. No-op (returns `false`) if running.
    pub fn start(&mut self, now: f64) -> bool {
        if self.is_running() {
            return false;
        }
        self.transport = Transport::Running(SchedulerState::at(now));
        true
    }

    /// Start from a precomputed cursor, replacing any running state.
    pub fn start_at(&mut self, state: SchedulerState) {
        self.transport = Transport::Running(state);
    }

    /// Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_running();
        self.transport = Transport::Stopped;
        was_running
    }

    /// Emit every beat whose time falls before `now + horizon`.
    ///
    /// Does nothing while stopped or while the output is unavailable; the
    /// cursor is left untouched so scheduling picks up where it was once the
    /// output appears. Returns the number of events emitted.
    pub fn drain<O>(&mut self, now: f64, tempo: &TempoConfig, output: &mut O) -> usize
    where
        O: ClickOutput + ?Sized,
    {
        let Transport::Running(mut state) = self.transport else {
            return 0;
        };
        if output.output_state() == OutputState::Unavailable {
            return 0;
        }

        let limit = now + self.horizon;
        let mut emitted = 0;
        while state.next_event_time < limit {
            let (next, event) = BeatSequencer::advance_with(state, tempo);
            trace!(
                "beat {} at {:.6}s{}",
                event.beat_index,
                event.time,
                if event.accent { " (accent)" } else { "" }
            );
            output.render_event(&event);
            emitted += 1;

            if next.next_event_time <= state.next_event_time {
                warn!("beat duration too short to advance past {:.6}s", state.next_event_time);
                break;
            }
            state = next;
        }

        self.transport = Transport::Running(state);
        if emitted > 0 {
            debug!("scheduled {emitted} beat(s), next at {:.6}s", state.next_event_time);
        }
        emitted
    }
}
