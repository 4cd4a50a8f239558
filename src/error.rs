use thiserror::Error;

/// Errors surfaced by the metronome core.
///
/// Live configuration (tempo, meter, volume) never produces one of these:
/// invalid values are ignored or clamped. Only caller-controlled inputs such
/// as an aligned start or a startup configuration are rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClickError {
    #[error("seconds per beat must be finite and at least 1ms, got {0}")]
    InvalidSecondsPerBeat(f64),

    #[error("offset into beat must be non-negative and finite, got {0}")]
    InvalidOffset(f64),

    #[error("beats per measure must be at least 1, got {0}")]
    InvalidBeatsPerMeasure(i64),

    #[error("invalid metronome configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("no default output device available")]
    NoOutputDevice,

    #[error("output device error: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, ClickError>;
