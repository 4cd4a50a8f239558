//! Benchmarks for click synthesis.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_click::output::{ClickCommand, ClickRenderer, ClickVoice};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_renderer(c: &mut Criterion) {
    let mut group = c.benchmark_group("click/renderer");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === SINGLE VOICE ===
        // Retriggered whenever it falls silent so every block does real work
        let mut voice = ClickVoice::new(SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("voice", size), &size, |b, _| {
            b.iter(|| {
                if !voice.is_active() {
                    voice.trigger(true);
                }
                buffer.fill(0.0);
                voice.render_block(black_box(&mut buffer));
            })
        });

        // === IDLE RENDERER ===
        // Baseline: nothing queued, just the zero fill
        let mut idle = ClickRenderer::new(SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| idle.render(black_box(&mut buffer)))
        });

        // === BUSY RENDERER ===
        // A click lands mid-block on every block, with earlier ones still
        // decaying, at a gain below unity
        let mut busy = ClickRenderer::new(SAMPLE_RATE);
        busy.set_gain(0.5);
        let mut accent = false;
        group.bench_with_input(BenchmarkId::new("busy", size), &size, |b, _| {
            b.iter(|| {
                let frame = busy.position() + (size / 2) as u64;
                busy.queue(ClickCommand { frame, accent });
                accent = !accent;
                busy.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
