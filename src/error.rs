//! Error taxonomy for the player core.
//!
//! Every failure is caught at the component that produced it, logged, and
//! converted into a transient [`Notice`] for the UI collaborator. None of these
//! errors is fatal to the session.

use std::time::Duration;

use thiserror::Error;

use crate::config::NoticeSettings;
use crate::media::PipelineKind;
use crate::player::{Notice, NoticeLevel};

/// The requested mode is not supported by the current track.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// The track has video but no audio, so audio-only mode is unreachable.
    #[error("this track is only available in immersive mode")]
    ImmersiveOnlyTrack,
    /// The track has no immersive video source.
    #[error("no immersive video for this track")]
    NoImmersiveContent,
    #[error("no track loaded")]
    NoTrackLoaded,
}

/// A pipeline failed to fetch or decode its source and retries are exhausted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to load {pipeline} for track {track_id} after {attempts} attempts: {reason}")]
pub struct LoadError {
    pub track_id: String,
    pub pipeline: PipelineKind,
    pub attempts: u32,
    pub reason: String,
}

/// Recovered silently (treated as paused) or surfaced briefly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransientPlaybackError {
    #[error("playback on {pipeline} was blocked: {reason}")]
    AutoplayRejected {
        pipeline: PipelineKind,
        reason: String,
    },
    #[error("seek to {target:.1}s timed out")]
    SeekTimeout { target: f64 },
}

/// Expected playlist boundaries and lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequencingError {
    #[error("end of playlist")]
    EndOfPlaylist,
    #[error("start of playlist")]
    StartOfPlaylist,
    #[error("unknown track: {0}")]
    UnknownTrack(String),
    #[error("playlist is empty")]
    EmptyPlaylist,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Transient(#[from] TransientPlaybackError),
    #[error(transparent)]
    Sequencing(#[from] SequencingError),
}

impl PlayerError {
    /// Convert this failure into the user-facing notice the UI should show.
    pub fn notice(&self, settings: &NoticeSettings) -> Notice {
        let (text, level) = match self {
            PlayerError::Content(ContentError::ImmersiveOnlyTrack) => (
                "This chapter is only available in 360° mode".to_string(),
                NoticeLevel::Info,
            ),
            PlayerError::Content(ContentError::NoImmersiveContent) => (
                "No 360° video for this chapter".to_string(),
                NoticeLevel::Info,
            ),
            PlayerError::Content(ContentError::NoTrackLoaded) => {
                ("Nothing is loaded yet".to_string(), NoticeLevel::Info)
            }
            PlayerError::Load(e) => (
                format!("Could not load {}. Press retry to try again", e.pipeline),
                NoticeLevel::Error,
            ),
            PlayerError::Transient(TransientPlaybackError::AutoplayRejected { .. }) => {
                ("Press play to continue".to_string(), NoticeLevel::Warning)
            }
            PlayerError::Transient(TransientPlaybackError::SeekTimeout { .. }) => {
                ("Seeking is taking longer than expected".to_string(), NoticeLevel::Warning)
            }
            PlayerError::Sequencing(SequencingError::EndOfPlaylist) => {
                ("You reached the last chapter".to_string(), NoticeLevel::Info)
            }
            PlayerError::Sequencing(SequencingError::StartOfPlaylist) => {
                ("Already at the first chapter".to_string(), NoticeLevel::Info)
            }
            PlayerError::Sequencing(SequencingError::UnknownTrack(id)) => {
                (format!("Chapter {id} not found"), NoticeLevel::Warning)
            }
            PlayerError::Sequencing(SequencingError::EmptyPlaylist) => {
                ("The playlist is empty".to_string(), NoticeLevel::Warning)
            }
        };

        let dismiss_after = match level {
            NoticeLevel::Error => Duration::from_millis(settings.error_dismiss_ms),
            _ => Duration::from_millis(settings.info_dismiss_ms),
        };

        Notice {
            text,
            level,
            dismiss_after,
        }
    }
}

/// Errors from reading a playlist feed. Callers fall back to the default track.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("failed to read feed {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON feed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed TOML feed: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("feed contains no playable tracks")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_use_the_longer_error_dismiss_delay() {
        let settings = NoticeSettings::default();
        let err = PlayerError::from(LoadError {
            track_id: "3".into(),
            pipeline: PipelineKind::Video,
            attempts: 4,
            reason: "network".into(),
        });

        let notice = err.notice(&settings);
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(
            notice.dismiss_after,
            Duration::from_millis(settings.error_dismiss_ms)
        );
        assert!(notice.text.contains("video"));
    }

    #[test]
    fn sequencing_boundaries_are_informational() {
        let settings = NoticeSettings::default();
        let notice = PlayerError::from(SequencingError::EndOfPlaylist).notice(&settings);
        assert_eq!(notice.level, NoticeLevel::Info);
        assert_eq!(
            notice.dismiss_after,
            Duration::from_millis(settings.info_dismiss_ms)
        );
    }
}
