use std::fmt;

use thiserror::Error;

/// Which of the two media pipelines an event or command concerns.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// Primary pipeline: the audio-only stream.
    Audio,
    /// Secondary pipeline: the immersive 360° video stream.
    Video,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 2] = [PipelineKind::Audio, PipelineKind::Video];

    pub fn other(self) -> Self {
        match self {
            PipelineKind::Audio => PipelineKind::Video,
            PipelineKind::Video => PipelineKind::Audio,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            PipelineKind::Audio => 0,
            PipelineKind::Video => 1,
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineKind::Audio => f.write_str("audio"),
            PipelineKind::Video => f.write_str("video"),
        }
    }
}

/// How much of the source the host has buffered, mirroring the usual media
/// element ready states.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    #[default]
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    pub fn can_play(self) -> bool {
        self >= ReadyState::HaveFutureData
    }
}

/// A play request the host refused outright (autoplay policy, no source).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct PlayRejected {
    pub reason: String,
}

/// Lifecycle events a host pipeline reports back to the player.
///
/// Every event is delivered together with the load generation that was
/// current when the pipeline produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    LoadedMetadata { duration: f64 },
    /// Enough data is buffered to start playback.
    CanPlay,
    Playing,
    Paused,
    /// A seek has settled.
    Seeked,
    TimeUpdate,
    VolumeChange,
    Ended,
    Error { message: String },
    /// A play request was rejected after it was accepted.
    PlayRejected { reason: String },
}

/// One media decode/playback unit supplied by the host.
///
/// Calls are requests: state changes are reported back asynchronously as
/// [`MediaEvent`]s, so callers must not assume synchronous completion.
pub trait MediaPipeline {
    fn kind(&self) -> PipelineKind;

    fn source(&self) -> Option<&str>;

    /// Start fetching `uri`. Every event produced for it carries `generation`.
    fn load(&mut self, uri: &str, generation: u64);

    /// Drop the current source; the pipeline stays silent until the next load.
    fn unload(&mut self, generation: u64);

    fn load_generation(&self) -> u64;

    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    /// Known duration, `None` until metadata has arrived.
    fn duration(&self) -> Option<f64>;

    fn is_paused(&self) -> bool;

    fn play(&mut self) -> Result<(), PlayRejected>;

    fn pause(&mut self);

    fn is_muted(&self) -> bool;

    fn set_muted(&mut self, muted: bool);

    fn ready_state(&self) -> ReadyState;

    fn has_source(&self) -> bool {
        self.source().is_some()
    }
}
