use std::sync::mpsc::Sender;
use std::time::Duration;

use serde::Serialize;

use crate::config::NoticeSettings;
use crate::error::PlayerError;

use super::session::PlaybackMode;

/// Commands the UI collaborator sends to the player.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SwitchToAudio,
    SwitchToImmersive,
    Next,
    Previous,
    SelectTrack(String),
    ToggleMute,
    /// The user started dragging the scrubber.
    BeginScrub,
    /// The user released the scrubber at this position (seconds).
    Scrub(f64),
    Play,
    Pause,
    TogglePlay,
    /// Reload the current track after a load error.
    Retry,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A transient status message with its auto-dismiss delay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    pub dismiss_after: Duration,
}

/// Commands for the immersive-scene renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneCommand {
    ResetHeading,
    SourceChanged { uri: Option<String> },
}

/// Everything the player reports to its collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PlayerEvent {
    TrackChanged {
        track_id: String,
        title: String,
        playlist: String,
        index: usize,
        count: usize,
    },
    Progress {
        current_time: f64,
        duration: Option<f64>,
    },
    /// Scrubber length; `provisional` until the active pipeline reports metadata.
    ScrubberBounds {
        duration: f64,
        provisional: bool,
    },
    ModeChanged {
        mode: PlaybackMode,
        /// False for immersive-only tracks: the "exit to audio" control is disabled.
        can_exit_to_audio: bool,
    },
    MuteChanged {
        muted: bool,
    },
    PlaybackChanged {
        playing: bool,
    },
    Notice(Notice),
    Scene(SceneCommand),
}

/// Outbound side of the player. Sends never fail the caller: a UI that went
/// away simply stops receiving.
#[derive(Clone)]
pub struct Notifier {
    tx: Sender<PlayerEvent>,
    notices: NoticeSettings,
}

impl Notifier {
    pub fn new(tx: Sender<PlayerEvent>, notices: NoticeSettings) -> Self {
        Self { tx, notices }
    }

    pub fn emit(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Surface a failure as a transient notice.
    pub fn notice(&self, error: &PlayerError) {
        self.emit(PlayerEvent::Notice(error.notice(&self.notices)));
    }
}
