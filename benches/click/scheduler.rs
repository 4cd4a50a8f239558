//! Benchmarks for look-ahead draining.

use std::{hint::black_box, time::Duration};

use criterion::{BenchmarkId, Criterion};
use saavy_click::{
    output::RecordingOutput,
    scheduler::LookaheadScheduler,
    sequencing::{BeatSequencer, SchedulerState, TempoConfig},
};

pub fn bench_scheduler(c: &mut Criterion) {
    let mut group = c.benchmark_group("click/scheduler");
    let tempo = TempoConfig::new(180.0, 7, 0.5);

    group.bench_function("advance", |b| {
        let mut state = SchedulerState::at(0.0);
        b.iter(|| {
            let (next, event) = BeatSequencer::advance_with(black_box(state), &tempo);
            state = next;
            event
        })
    });

    // One drain per trigger period, as the interval trigger does.
    group.bench_function("steady_drain", |b| {
        let mut scheduler = LookaheadScheduler::new(Duration::from_millis(100));
        let mut output = RecordingOutput::new();
        let mut now = 0.0;
        scheduler.start(now);
        b.iter(|| {
            now += 0.025;
            let emitted = scheduler.drain(black_box(now), &tempo, &mut output);
            output.events.clear();
            emitted
        })
    });

    // Trigger stalled for `beats` beats; everything is drained in one go.
    for beats in [4usize, 64, 256] {
        group.bench_with_input(BenchmarkId::new("stall_drain", beats), &beats, |b, &beats| {
            let mut output = RecordingOutput::new();
            let stall = beats as f64 * tempo.seconds_per_beat();
            b.iter(|| {
                let mut scheduler = LookaheadScheduler::new(Duration::from_millis(100));
                scheduler.start(0.0);
                let emitted = scheduler.drain(black_box(stall), &tempo, &mut output);
                output.events.clear();
                emitted
            })
        });
    }

    group.finish();
}
