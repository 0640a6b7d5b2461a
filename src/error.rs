use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the sequencer to its callers. None of these interrupt
/// playback; the state the call was about to touch is left as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SequencerError {
    #[error("tempo {0} bpm is out of range (0, 1000)")]
    InvalidTempo(f64),

    #[error("step index {0} is out of range (0..16)")]
    StepOutOfRange(usize),

    #[error("schedule interval of {interval_ms} ms must be non-zero and shorter than the {lookahead_secs} s lookahead")]
    InvalidTiming { interval_ms: u64, lookahead_secs: f64 },

    #[error("unknown kit piece '{0}'")]
    UnknownKitPiece(String),

    #[error("scheduler thread is no longer running")]
    SchedulerGone,
}

pub type Result<T> = std::result::Result<T, SequencerError>;

/// Why a sample never made it into the engine. Loading happens off the
/// scheduler thread, so these are reported, never raised into playback.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not read '{path}': {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("'{path}' uses an unsupported sample format ({detail})")]
    Unsupported { path: PathBuf, detail: String },

    #[error("'{0}' contains no audio")]
    Empty(PathBuf),

    #[error("audio engine is not accepting samples")]
    EngineUnavailable,
}
