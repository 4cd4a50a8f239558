//! The public metronome.
//!
//! A [`Metronome`] owns its clock, live tempo configuration, click output and
//! trigger source. Nothing is global: an application that wants one shared
//! metronome holds one instance and passes it around.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};

use crate::{
    clock::Clock,
    config::MetronomeConfig,
    error::Result,
    output::{ClickOutput, OutputState},
    scheduler::{LookaheadScheduler, TriggerSource},
    sequencing::{PhaseAligner, PhaseRequest, ScheduledEvent, SchedulerState, TempoConfig},
};

/// Scheduler state and output, guarded together.
///
/// The trigger callback holds this lock for a whole drain, so a firing runs
/// to completion before anything else touches the cursor, and `stop` cannot
/// return while a drain is half done.
struct Core<O> {
    scheduler: LookaheadScheduler,
    output: O,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Look-ahead metronome.
///
/// * `C` - the clock clicks are timed against (usually the output's own clock)
/// * `O` - where clicks are rendered
/// * `T` - what fires the scheduler periodically
pub struct Metronome<C, O, T>
where
    C: Clock + 'static,
    O: ClickOutput + 'static,
    T: TriggerSource,
{
    config: MetronomeConfig,
    clock: Arc<C>,
    tempo: Arc<TempoConfig>,
    core: Arc<Mutex<Core<O>>>,
    trigger: T,
}

impl<C, O, T> Metronome<C, O, T>
where
    C: Clock + 'static,
    O: ClickOutput + 'static,
    T: TriggerSource,
{
    /// Build a stopped metronome. Fails only on an invalid `config`.
    pub fn new(config: MetronomeConfig, clock: C, output: O, trigger: T) -> Result<Self> {
        config.validate()?;

        let tempo = TempoConfig::new(config.bpm, config.beats_per_measure, config.volume);
        let core = Core {
            scheduler: LookaheadScheduler::new(config.lookahead),
            output,
        };

        Ok(Self {
            config,
            clock: Arc::new(clock),
            tempo: Arc::new(tempo),
            core: Arc::new(Mutex::new(core)),
            trigger,
        })
    }

    /// Set the tempo. Non-positive values are ignored.
    pub fn set_tempo_bpm(&self, bpm: f64) {
        self.tempo.set_tempo_bpm(bpm);
    }

    /// Set the meter. Values below 1 are ignored.
    pub fn set_beats_per_measure(&self, beats: i64) {
        self.tempo.set_beats_per_measure(beats);
    }

    /// Set the output volume, clamped to `[0, 1]`.
    ///
    /// Also acquires the output device if that has not happened yet.
    pub fn set_volume(&self, volume: f32) {
        let volume = self.tempo.set_volume(volume);
        let mut core = lock(&self.core);
        if core.output.ensure_output_ready() {
            core.output.set_output_gain(volume);
        }
    }

    /// Start on beat 0 at the current clock time. No-op if already running.
    pub fn start(&mut self) {
        {
            let mut core = lock(&self.core);
            if core.scheduler.is_running() {
                debug!("start ignored: already running");
                return;
            }
            self.prepare_output(&mut core.output);
            let now = self.clock.now();
            core.scheduler.start(now);
            info!("metronome started at {now:.6}s, {:.2} bpm", self.tempo.tempo_bpm());
        }
        self.arm_trigger();
    }

    /// Restart phase-aligned to an external timeline.
    ///
    /// * `offset_into_beat` - seconds since the reference's current beat began
    /// * `seconds_per_beat` - the reference's beat duration; becomes the live tempo
    /// * `initial_beat_index` - the reference's current beat in its measure, any sign
    /// * `beats_per_measure` - optional meter override; becomes the live meter
    ///
    /// Always restarts, even when running. Invalid input is rejected before
    /// anything changes.
    pub fn start_aligned(
        &mut self,
        offset_into_beat: f64,
        seconds_per_beat: f64,
        initial_beat_index: i64,
        beats_per_measure: Option<i64>,
    ) -> Result<()> {
        let request = PhaseRequest::new(
            offset_into_beat,
            seconds_per_beat,
            initial_beat_index,
            beats_per_measure,
        )?;

        self.stop();

        self.tempo.set_seconds_per_beat(request.seconds_per_beat());
        if let Some(beats) = request.beats_per_measure() {
            self.tempo.set_beats_per_measure(i64::from(beats));
        }

        {
            let mut core = lock(&self.core);
            self.prepare_output(&mut core.output);
            let now = self.clock.now();
            let state = PhaseAligner::align(now, &request, self.tempo.beats_per_measure());
            core.scheduler.start_at(state);
            info!(
                "metronome started aligned: beat {} at {:.6}s",
                state.beat_index, state.next_event_time
            );
        }
        self.arm_trigger();
        Ok(())
    }

    /// Stop. After this returns no further clicks are scheduled.
    pub fn stop(&mut self) {
        let was_running = lock(&self.core).scheduler.stop();
        // Outside the core lock: the trigger's own callback takes that lock.
        self.trigger.cancel();
        if was_running {
            info!("metronome stopped");
        }
    }

    /// Play one accented click shortly from now, independent of the scheduler.
    pub fn click_once(&self) {
        let mut core = lock(&self.core);
        if !core.output.ensure_output_ready() {
            return;
        }
        let event = ScheduledEvent {
            time: self.clock.now() + self.config.click_once_delay.as_secs_f64(),
            accent: true,
            beat_index: 0,
        };
        core.output.render_event(&event);
    }

    pub fn is_running(&self) -> bool {
        lock(&self.core).scheduler.is_running()
    }

    /// Where the look-ahead cursor is, if running.
    pub fn snapshot(&self) -> Option<SchedulerState> {
        lock(&self.core).scheduler.state()
    }

    pub fn tempo_bpm(&self) -> f64 {
        self.tempo.tempo_bpm()
    }

    pub fn seconds_per_beat(&self) -> f64 {
        self.tempo.seconds_per_beat()
    }

    pub fn beats_per_measure(&self) -> u32 {
        self.tempo.beats_per_measure()
    }

    pub fn volume(&self) -> f32 {
        self.tempo.volume()
    }

    pub fn config(&self) -> &MetronomeConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run `f` with exclusive access to the output.
    pub fn with_output<R>(&self, f: impl FnOnce(&mut O) -> R) -> R {
        f(&mut lock(&self.core).output)
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    /// Acquire, resume and set gain on the output, and wake the clock.
    fn prepare_output(&self, output: &mut O) {
        if !output.ensure_output_ready() {
            return;
        }
        output.set_output_gain(self.tempo.volume());
        if output.output_state() == OutputState::Suspended {
            output.resume_output();
        }
        if self.clock.is_suspended() {
            self.clock.resume();
        }
    }

    fn arm_trigger(&mut self) {
        let core = Arc::clone(&self.core);
        let clock = Arc::clone(&self.clock);
        let tempo = Arc::clone(&self.tempo);

        self.trigger.start(
            self.config.trigger_period,
            Box::new(move || {
                let mut core = lock(&core);
                let Core { scheduler, output } = &mut *core;
                scheduler.drain(clock.now(), &tempo, output);
            }),
        );
    }
}

impl<C, O, T> Drop for Metronome<C, O, T>
where
    C: Clock + 'static,
    O: ClickOutput + 'static,
    T: TriggerSource,
{
    fn drop(&mut self) {
        self.trigger.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        output::RecordingOutput,
        scheduler::{ManualTrigger, ManualTriggerHandle},
    };

    type TestMetronome = Metronome<ManualClock, RecordingOutput, ManualTrigger>;

    fn metronome_with(output: RecordingOutput) -> (TestMetronome, ManualClock, ManualTriggerHandle) {
        let clock = ManualClock::starting_at(1.0);
        let trigger = ManualTrigger::new();
        let handle = trigger.handle();
        let metronome =
            Metronome::new(MetronomeConfig::default(), clock.clone(), output, trigger).unwrap();
        (metronome, clock, handle)
    }

    fn metronome() -> (TestMetronome, ManualClock, ManualTriggerHandle) {
        metronome_with(RecordingOutput::new())
    }

    fn events(metronome: &TestMetronome) -> Vec<ScheduledEvent> {
        metronome.with_output(|o| o.events.clone())
    }

    #[test]
    fn start_schedules_beat_zero_at_now() {
        let (mut metronome, _clock, trigger) = metronome();
        metronome.start();
        assert!(trigger.fire());

        let events = events(&metronome);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].time, 1.0);
        assert_eq!(events[0].beat_index, 0);
        assert!(events[0].accent);
    }

    #[test]
    fn second_start_keeps_the_cursor() {
        let (mut metronome, clock, trigger) = metronome();
        metronome.start();
        trigger.fire();
        let before = metronome.snapshot();

        clock.advance(0.3);
        metronome.start();
        assert_eq!(metronome.snapshot(), before);
    }

    #[test]
    fn stop_prevents_further_events() {
        let (mut metronome, clock, trigger) = metronome();
        metronome.start();
        trigger.fire();

        metronome.stop();
        clock.advance(5.0);
        assert!(!trigger.fire());
        assert_eq!(events(&metronome).len(), 1);
        assert_eq!(metronome.snapshot(), None);
    }

    #[test]
    fn aligned_start_restarts_with_new_phase() {
        let (mut metronome, _clock, trigger) = metronome();
        metronome.start();
        trigger.fire();

        metronome.start_aligned(0.2, 0.5, 2, Some(4)).unwrap();
        let state = metronome.snapshot().unwrap();
        assert!((state.next_event_time - 1.3).abs() < 1e-9);
        assert_eq!(state.beat_index, 3);
        assert_eq!(metronome.seconds_per_beat(), 0.5);
    }

    #[test]
    fn rejected_aligned_start_leaves_transport_alone() {
        let (mut metronome, _clock, trigger) = metronome();
        metronome.start();
        trigger.fire();
        let before = metronome.snapshot();

        assert!(metronome.start_aligned(0.0, 0.0, 0, None).is_err());
        assert_eq!(metronome.snapshot(), before);
        assert!(trigger.is_armed());
    }

    #[test]
    fn start_resumes_suspended_output_and_clock() {
        let mut output = RecordingOutput::new();
        output.suspend();
        let (mut metronome, clock, _trigger) = metronome_with(output);
        clock.suspend();

        metronome.start();
        assert_eq!(metronome.with_output(|o| o.resume_count), 1);
        assert!(!clock.is_suspended());
    }

    #[test]
    fn unavailable_output_skips_scheduling_until_ready() {
        let (mut metronome, _clock, trigger) = metronome_with(RecordingOutput::refusing());
        metronome.start();
        assert!(metronome.is_running());
        trigger.fire();
        assert!(events(&metronome).is_empty());

        metronome.with_output(|o| o.allow());
        metronome.set_volume(0.8);
        trigger.fire();
        assert_eq!(events(&metronome).len(), 1);
        assert_eq!(metronome.with_output(|o| o.gain), 0.8);
    }

    #[test]
    fn click_once_bypasses_the_scheduler() {
        let (metronome, _clock, _trigger) = metronome();
        metronome.click_once();

        let events = events(&metronome);
        assert_eq!(events.len(), 1);
        assert!(events[0].accent);
        assert!((events[0].time - 1.01).abs() < 1e-9);
        assert!(!metronome.is_running());
    }

    #[test]
    fn invalid_live_settings_are_ignored() {
        let (metronome, _clock, _trigger) = metronome();
        metronome.set_tempo_bpm(-10.0);
        metronome.set_beats_per_measure(0);
        metronome.set_volume(7.0);

        assert_eq!(metronome.tempo_bpm(), 120.0);
        assert_eq!(metronome.beats_per_measure(), 4);
        assert_eq!(metronome.volume(), 1.0);
    }
}
