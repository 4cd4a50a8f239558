use log::debug;

use super::{beat::SchedulerState, tempo::MIN_SECONDS_PER_BEAT};
use crate::error::{ClickError, Result};

/*
Phase Alignment
===============

Starting "in phase" means joining an external timeline (a playhead, another
device) at its current position instead of starting fresh on beat 0.

The reference tells us how far it is into its current beat and which beat of
the measure that is. We must schedule the next boundary that is still ahead
of us, never one in the past:

     beat 2            beat 3            beat 4
       |-----------------|-----------------|
       |<-offset->|      |
                  now    next event
                  |<---->|
               time to next beat = beat - (offset mod beat)

  - offset lands exactly on a boundary: the current beat is the one about to
    sound, so it keeps its index and plays at `now`.
  - offset is partway through a beat: the current beat already sounded on
    the reference, so the next event is the following beat.

Beat indices from the reference may be negative (count-ins) or larger than
the measure, so they are folded into [0, beats_per_measure) first.
*/

/// Validated inputs for an aligned start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseRequest {
    offset_into_beat: f64,
    seconds_per_beat: f64,
    initial_beat_index: i64,
    beats_per_measure: Option<u32>,
}

impl PhaseRequest {
    /// Validate an aligned-start request.
    ///
    /// * `offset_into_beat` - seconds since the reference's current beat began (>= 0)
    /// * `seconds_per_beat` - the reference's beat duration (>= [`MIN_SECONDS_PER_BEAT`])
    /// * `initial_beat_index` - the reference's current beat in its measure, any sign
    /// * `beats_per_measure` - optional meter override (>= 1)
    pub fn new(
        offset_into_beat: f64,
        seconds_per_beat: f64,
        initial_beat_index: i64,
        beats_per_measure: Option<i64>,
    ) -> Result<Self> {
        if !(seconds_per_beat >= MIN_SECONDS_PER_BEAT && seconds_per_beat.is_finite()) {
            return Err(ClickError::InvalidSecondsPerBeat(seconds_per_beat));
        }
        if !(offset_into_beat >= 0.0 && offset_into_beat.is_finite()) {
            return Err(ClickError::InvalidOffset(offset_into_beat));
        }
        let beats_per_measure = beats_per_measure
            .map(|beats| match u32::try_from(beats) {
                Ok(b) if b >= 1 => Ok(b),
                _ => Err(ClickError::InvalidBeatsPerMeasure(beats)),
            })
            .transpose()?;

        Ok(Self {
            offset_into_beat,
            seconds_per_beat,
            initial_beat_index,
            beats_per_measure,
        })
    }

    pub fn seconds_per_beat(&self) -> f64 {
        self.seconds_per_beat
    }

    pub fn beats_per_measure(&self) -> Option<u32> {
        self.beats_per_measure
    }
}

/// One-shot computation of the first scheduler state for an aligned start.
pub struct PhaseAligner;

impl PhaseAligner {
    /// Compute the state whose first event is the next reference beat boundary.
    ///
    /// `beats_per_measure` is used when the request carries no override.
    pub fn align(now: f64, request: &PhaseRequest, beats_per_measure: u32) -> SchedulerState {
        let beats_per_measure = request.beats_per_measure.unwrap_or(beats_per_measure).max(1);
        let beat = request.seconds_per_beat;

        let remainder = request.offset_into_beat % beat;
        let time_to_next_beat = if remainder == 0.0 {
            0.0
        } else {
            beat - remainder
        };

        let normalized = request
            .initial_beat_index
            .rem_euclid(i64::from(beats_per_measure)) as u32;

        let beat_index = if time_to_next_beat == 0.0 {
            normalized
        } else {
            (normalized + 1) % beats_per_measure
        };

        debug!(
            "aligned start: next beat {beat_index} in {time_to_next_beat:.4}s \
             ({beats_per_measure} beats per measure)"
        );

        SchedulerState {
            next_event_time: now + time_to_next_beat,
            beat_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn align(offset: f64, beat: f64, index: i64, meter: Option<i64>) -> SchedulerState {
        let request = PhaseRequest::new(offset, beat, index, meter).unwrap();
        PhaseAligner::align(10.0, &request, 4)
    }

    #[test]
    fn on_boundary_keeps_the_current_beat() {
        let state = align(0.0, 0.5, 2, Some(4));
        assert_eq!(state.next_event_time, 10.0);
        assert_eq!(state.beat_index, 2);
    }

    #[test]
    fn mid_beat_schedules_the_following_beat() {
        let state = align(0.2, 0.5, 2, Some(4));
        assert!((state.next_event_time - 10.3).abs() < 1e-9);
        assert_eq!(state.beat_index, 3);
    }

    #[test]
    fn mid_beat_on_last_beat_wraps_to_downbeat() {
        let state = align(0.1, 0.5, 3, Some(4));
        assert_eq!(state.beat_index, 0);
    }

    #[test]
    fn offsets_longer_than_a_beat_are_folded() {
        // 1.0s into a 0.5s beat is a boundary.
        let state = align(1.0, 0.5, 1, None);
        assert_eq!(state.next_event_time, 10.0);
        assert_eq!(state.beat_index, 1);

        let state = align(1.2, 0.5, 1, None);
        assert!((state.next_event_time - 10.3).abs() < 1e-9);
        assert_eq!(state.beat_index, 2);
    }

    #[test]
    fn negative_indices_are_normalized() {
        assert_eq!(align(0.0, 0.5, -1, Some(4)).beat_index, 3);
        assert_eq!(align(0.0, 0.5, -5, Some(4)).beat_index, 3);
        assert_eq!(align(0.0, 0.5, 9, Some(4)).beat_index, 1);
        assert_eq!(align(0.25, 0.5, -1, Some(4)).beat_index, 0);
    }

    #[test]
    fn falls_back_to_live_meter_without_override() {
        let request = PhaseRequest::new(0.0, 0.5, 4, None).unwrap();
        assert_eq!(PhaseAligner::align(0.0, &request, 3).beat_index, 1);
    }

    #[test]
    fn rejects_invalid_requests() {
        assert_eq!(
            PhaseRequest::new(0.0, 0.0, 0, None),
            Err(ClickError::InvalidSecondsPerBeat(0.0))
        );
        assert!(matches!(
            PhaseRequest::new(0.0, f64::NAN, 0, None),
            Err(ClickError::InvalidSecondsPerBeat(_))
        ));
        assert!(matches!(
            PhaseRequest::new(0.0, 1e-300, 0, None),
            Err(ClickError::InvalidSecondsPerBeat(_))
        ));
        assert!(matches!(
            PhaseRequest::new(0.0, MIN_SECONDS_PER_BEAT / 2.0, 0, None),
            Err(ClickError::InvalidSecondsPerBeat(_))
        ));
        assert!(PhaseRequest::new(0.0, MIN_SECONDS_PER_BEAT, 0, None).is_ok());
        assert_eq!(
            PhaseRequest::new(-0.1, 0.5, 0, None),
            Err(ClickError::InvalidOffset(-0.1))
        );
        assert_eq!(
            PhaseRequest::new(0.0, 0.5, 0, Some(0)),
            Err(ClickError::InvalidBeatsPerMeasure(0))
        );
    }
}
