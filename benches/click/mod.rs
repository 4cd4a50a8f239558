//! Benchmarks for the metronome's realtime paths.

mod renderer;
mod scheduler;

pub use renderer::bench_renderer;
pub use scheduler::bench_scheduler;
