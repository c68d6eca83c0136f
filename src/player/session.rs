use serde::Serialize;

use crate::media::{MediaPipeline, PipelineKind};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    /// The audio pipeline drives the transport; video shadows it muted.
    #[default]
    AudioOnly,
    /// The 360° video pipeline drives the transport; audio shadows it muted.
    Immersive,
}

impl PlaybackMode {
    /// The pipeline that is active in this mode.
    pub fn active_pipeline(self) -> PipelineKind {
        match self {
            PlaybackMode::AudioOnly => PipelineKind::Audio,
            PlaybackMode::Immersive => PipelineKind::Video,
        }
    }
}

/// Per-player playback state. Lives as long as the player; transient fields
/// are reset on every track load.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub mode: PlaybackMode,
    pub active: PipelineKind,
    pub was_playing_before_transition: bool,
    pub is_first_play: bool,
    pub is_seeking: bool,
    pub is_scrubbing: bool,
    /// Set by the first end-of-track detector that fires; cleared on load.
    pub advance_triggered: bool,
    /// Mute preference for whichever pipeline is active.
    pub user_muted: bool,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            mode: PlaybackMode::AudioOnly,
            active: PipelineKind::Audio,
            was_playing_before_transition: false,
            is_first_play: true,
            is_seeking: false,
            is_scrubbing: false,
            advance_triggered: false,
            user_muted: false,
        }
    }
}

impl PlaybackSession {
    /// Flip the mode and the active pointer together.
    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
        self.active = mode.active_pipeline();
    }

    pub fn reset_for_load(&mut self) {
        self.was_playing_before_transition = false;
        self.is_seeking = false;
        self.is_scrubbing = false;
        self.advance_triggered = false;
    }
}

/// The two pipelines plus the session that says which one is active.
pub struct Deck<P> {
    pub audio: P,
    pub video: P,
    pub session: PlaybackSession,
}

impl<P: MediaPipeline> Deck<P> {
    pub fn new(audio: P, video: P) -> Self {
        Self {
            audio,
            video,
            session: PlaybackSession::default(),
        }
    }

    pub fn pipeline(&self, kind: PipelineKind) -> &P {
        match kind {
            PipelineKind::Audio => &self.audio,
            PipelineKind::Video => &self.video,
        }
    }

    pub fn pipeline_mut(&mut self, kind: PipelineKind) -> &mut P {
        match kind {
            PipelineKind::Audio => &mut self.audio,
            PipelineKind::Video => &mut self.video,
        }
    }

    pub fn active(&self) -> &P {
        self.pipeline(self.session.active)
    }

    pub fn active_mut(&mut self) -> &mut P {
        self.pipeline_mut(self.session.active)
    }

    pub fn shadow(&self) -> &P {
        self.pipeline(self.session.active.other())
    }

    pub fn shadow_mut(&mut self) -> &mut P {
        self.pipeline_mut(self.session.active.other())
    }

    pub fn is_playing(&self) -> bool {
        !self.active().is_paused()
    }

    pub fn pause_all(&mut self) {
        for kind in PipelineKind::ALL {
            let p = self.pipeline_mut(kind);
            if !p.is_paused() {
                p.pause();
            }
        }
    }
}
