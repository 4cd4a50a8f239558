pub mod beat;
pub mod phase;
pub mod tempo;

pub use beat::{BeatSequencer, ScheduledEvent, SchedulerState};
pub use phase::{PhaseAligner, PhaseRequest};
pub use tempo::{TempoConfig, MAX_TEMPO_BPM, MIN_SECONDS_PER_BEAT};
