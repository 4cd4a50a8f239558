use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use log::{debug, warn};

/// Shortest beat the scheduler accepts (1ms).
///
/// Every drain emits up to `horizon / seconds_per_beat` events while holding
/// the scheduler lock, so the beat duration needs a floor well above float
/// resolution.
pub const MIN_SECONDS_PER_BEAT: f64 = 0.001;
/// Fastest tempo the scheduler accepts, `60 / MIN_SECONDS_PER_BEAT`.
pub const MAX_TEMPO_BPM: f64 = 60.0 / MIN_SECONDS_PER_BEAT;

/// Live tempo, meter and volume shared between the control side and the
/// scheduler.
///
/// Every setter is a single atomic store, so the scheduler always reads a
/// whole value and never a half-applied update. Invalid input is ignored
/// (tempo, meter) or clamped (volume) and the previous value stays in effect.
#[derive(Debug)]
pub struct TempoConfig {
    /// `f64` bits
    seconds_per_beat: AtomicU64,
    beats_per_measure: AtomicU32,
    /// `f32` bits
    volume: AtomicU32,
}

impl TempoConfig {
    /// Build from already-validated values.
    pub fn new(bpm: f64, beats_per_measure: u32, volume: f32) -> Self {
        Self {
            seconds_per_beat: AtomicU64::new((60.0 / bpm).to_bits()),
            beats_per_measure: AtomicU32::new(beats_per_measure.max(1)),
            volume: AtomicU32::new(volume.clamp(0.0, 1.0).to_bits()),
        }
    }

    /// Set the tempo in beats per minute. Returns `false` if ignored.
    ///
    /// Accepts `(0, MAX_TEMPO_BPM]`.
    pub fn set_tempo_bpm(&self, bpm: f64) -> bool {
        if !(bpm > 0.0 && bpm <= MAX_TEMPO_BPM) {
            warn!("ignoring tempo of {bpm} bpm");
            return false;
        }
        self.store_seconds_per_beat(60.0 / bpm);
        debug!("tempo set to {bpm} bpm");
        true
    }

    /// Set the beat duration directly. Returns `false` if ignored.
    ///
    /// Accepts finite durations of at least [`MIN_SECONDS_PER_BEAT`].
    pub fn set_seconds_per_beat(&self, seconds_per_beat: f64) -> bool {
        if !(seconds_per_beat >= MIN_SECONDS_PER_BEAT && seconds_per_beat.is_finite()) {
            warn!("ignoring beat duration of {seconds_per_beat}s");
            return false;
        }
        self.store_seconds_per_beat(seconds_per_beat);
        true
    }

    /// Set the meter. Values below 1 are ignored.
    pub fn set_beats_per_measure(&self, beats: i64) -> bool {
        let Ok(beats) = u32::try_from(beats) else {
            warn!("ignoring meter of {beats} beats per measure");
            return false;
        };
        if beats < 1 {
            warn!("ignoring meter of {beats} beats per measure");
            return false;
        }
        self.beats_per_measure.store(beats, Ordering::Release);
        debug!("meter set to {beats} beats per measure");
        true
    }

    /// Clamp into `[0, 1]` and store. NaN is ignored.
    ///
    /// Returns the volume now in effect.
    pub fn set_volume(&self, volume: f32) -> f32 {
        if volume.is_nan() {
            warn!("ignoring NaN volume");
            return self.volume();
        }
        let volume = volume.clamp(0.0, 1.0);
        self.volume.store(volume.to_bits(), Ordering::Release);
        volume
    }

    pub fn seconds_per_beat(&self) -> f64 {
        f64::from_bits(self.seconds_per_beat.load(Ordering::Acquire))
    }

    pub fn tempo_bpm(&self) -> f64 {
        60.0 / self.seconds_per_beat()
    }

    pub fn beats_per_measure(&self) -> u32 {
        self.beats_per_measure.load(Ordering::Acquire)
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Acquire))
    }

    fn store_seconds_per_beat(&self, seconds_per_beat: f64) {
        self.seconds_per_beat
            .store(seconds_per_beat.to_bits(), Ordering::Release);
    }
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self::new(120.0, 4, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_bpm_to_beat_duration() {
        let tempo = TempoConfig::default();
        for bpm in [30.0, 60.0, 97.5, 120.0, 240.0, 333.0] {
            assert!(tempo.set_tempo_bpm(bpm));
            assert!((tempo.seconds_per_beat() - 60.0 / bpm).abs() < 1e-12);
        }
    }

    #[test]
    fn ignores_non_positive_tempo() {
        let tempo = TempoConfig::new(90.0, 4, 0.5);
        for bpm in [0.0, -120.0, f64::NAN, f64::INFINITY] {
            assert!(!tempo.set_tempo_bpm(bpm));
        }
        assert!((tempo.tempo_bpm() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn ignores_tempos_faster_than_the_floor() {
        let tempo = TempoConfig::new(120.0, 4, 0.5);
        for bpm in [MAX_TEMPO_BPM * 1.01, 1e7, 1e18, f64::MAX] {
            assert!(!tempo.set_tempo_bpm(bpm), "{bpm} bpm accepted");
        }
        for seconds in [MIN_SECONDS_PER_BEAT / 2.0, 6e-17, 1e-300, f64::MIN_POSITIVE] {
            assert!(!tempo.set_seconds_per_beat(seconds), "{seconds}s accepted");
        }
        assert_eq!(tempo.seconds_per_beat(), 0.5);

        assert!(tempo.set_tempo_bpm(MAX_TEMPO_BPM));
        assert!(tempo.seconds_per_beat() >= MIN_SECONDS_PER_BEAT * (1.0 - 1e-12));
        assert!(tempo.set_seconds_per_beat(MIN_SECONDS_PER_BEAT));
    }

    #[test]
    fn ignores_meter_below_one() {
        let tempo = TempoConfig::new(120.0, 3, 0.5);
        assert!(!tempo.set_beats_per_measure(0));
        assert!(!tempo.set_beats_per_measure(-4));
        assert_eq!(tempo.beats_per_measure(), 3);

        assert!(tempo.set_beats_per_measure(7));
        assert_eq!(tempo.beats_per_measure(), 7);
    }

    #[test]
    fn clamps_volume() {
        let tempo = TempoConfig::default();
        assert_eq!(tempo.set_volume(1.5), 1.0);
        assert_eq!(tempo.set_volume(-0.2), 0.0);
        assert_eq!(tempo.set_volume(0.3), 0.3);
        assert_eq!(tempo.set_volume(f32::NAN), 0.3);
    }
}
