//! Look-ahead metronome scheduling.
//!
//! A coarse periodic trigger wakes the [`scheduler`] every few milliseconds;
//! each firing hands every beat inside a short look-ahead window to the
//! [`output`] with its exact timestamp on the output's [`clock`]. Beats land
//! sample-accurately no matter how late or irregular the trigger is.
//!
//! ```ignore
//! use saavy_click::{output::CpalOutput, scheduler::IntervalTrigger, Metronome, MetronomeConfig};
//!
//! let output = CpalOutput::new();
//! let clock = output.clock();
//! let mut metronome = Metronome::new(MetronomeConfig::default(), clock, output, IntervalTrigger::new())?;
//! metronome.set_tempo_bpm(96.0);
//! metronome.start();
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod metronome;
pub mod output;
pub mod scheduler; // Trigger sources and the drain loop
pub mod sequencing; // Beat stepping, phase alignment, live tempo

pub use config::MetronomeConfig;
pub use error::{ClickError, Result};
pub use metronome::Metronome;

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
