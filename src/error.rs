use std::path::PathBuf;

use thiserror::Error;

/// Everything that can be wrong with a kit. All of these are caught before
/// playback starts; the audio path itself never fails.
#[derive(Debug, Error)]
pub enum KitError {
    #[error("tempo must be non-zero")]
    ZeroTempo,

    #[error("steps per bar must be non-zero")]
    ZeroStepsPerBar,

    #[error(
        "{sample_rate} Hz at {bpm} BPM with {beats_per_bar} beats over {steps_per_bar} steps \
         leaves less than one frame per step"
    )]
    StepTooShort {
        sample_rate: u32,
        bpm: u32,
        beats_per_bar: u32,
        steps_per_bar: usize,
    },

    #[error("{sample_rate} Hz at {bpm} BPM gives more frames per beat or step than fit in 32 bits")]
    TimingOverflow { sample_rate: u32, bpm: u32 },

    #[error("the block ring needs at least 2 blocks, got {0}")]
    RingTooSmall(usize),

    #[error("block size must be non-zero")]
    ZeroBlockSize,

    #[error("expected {expected} voices, found {found}")]
    VoiceCount { expected: usize, found: usize },

    #[error("voice {voice}: pan {pan} is outside 0..=32")]
    PanOutOfRange { voice: usize, pan: u8 },

    #[error("voice {voice}: unknown sample '{name}'")]
    UnknownSample { voice: usize, name: String },

    #[error("sample '{0}' is defined twice")]
    DuplicateSample(String),

    #[error("sample '{0}' has no audio")]
    EmptySample(String),

    #[error("no built-in waveform named '{0}'")]
    UnknownBuiltin(String),

    #[error("pattern '{pattern}': expected {expected} rows, found {found}")]
    PatternRows {
        pattern: String,
        expected: usize,
        found: usize,
    },

    #[error("pattern '{pattern}' voice {voice}: expected {expected} steps, found {found}")]
    TrackLength {
        pattern: String,
        voice: usize,
        expected: usize,
        found: usize,
    },

    #[error("pattern '{pattern}' voice {voice} step {step}: '{marker}' is not a space or 1-9")]
    BadMarker {
        pattern: String,
        voice: usize,
        step: usize,
        marker: char,
    },

    #[error("the arrangement has no bars")]
    EmptyArrangement,

    #[error("bar {bar} references pattern {index}, but only {available} exist")]
    UnknownPattern {
        bar: usize,
        index: usize,
        available: usize,
    },

    #[error("could not read {path}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}
