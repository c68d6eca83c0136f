use crate::error::{ContentError, TransientPlaybackError};
use crate::library::Track;
use crate::media::{MediaPipeline, PipelineKind};

use super::mute::MuteArbiter;
use super::session::{Deck, PlaybackMode};

/// Outcome of a mode switch request.
#[derive(Debug, Clone, PartialEq)]
pub enum ModeSwitch {
    /// The requested mode was already active.
    Unchanged,
    /// Mode flipped. `rejected` is set when the resume afterwards was refused.
    Switched {
        rejected: Option<TransientPlaybackError>,
    },
}

/// Moves the transport between the audio and the immersive pipeline while
/// keeping the playhead, the play state and the mute preference.
pub struct PlaybackModeController;

impl PlaybackModeController {
    pub fn switch_to_immersive<P: MediaPipeline>(
        deck: &mut Deck<P>,
        track: Option<&Track>,
    ) -> Result<ModeSwitch, ContentError> {
        let track = track.ok_or(ContentError::NoTrackLoaded)?;
        if !track.has_video() {
            return Err(ContentError::NoImmersiveContent);
        }
        Ok(Self::transition(deck, PlaybackMode::Immersive))
    }

    pub fn switch_to_audio_only<P: MediaPipeline>(
        deck: &mut Deck<P>,
        track: Option<&Track>,
    ) -> Result<ModeSwitch, ContentError> {
        let track = track.ok_or(ContentError::NoTrackLoaded)?;
        if !track.has_audio() {
            return Err(ContentError::ImmersiveOnlyTrack);
        }
        Ok(Self::transition(deck, PlaybackMode::AudioOnly))
    }

    /// Drop back to audio-only ahead of a track change. Nothing is resumed;
    /// the loader decides what plays next.
    pub fn reset_to_audio_only<P: MediaPipeline>(deck: &mut Deck<P>) -> bool {
        if deck.session.mode == PlaybackMode::AudioOnly {
            return false;
        }
        deck.pause_all();
        deck.session.set_mode(PlaybackMode::AudioOnly);
        MuteArbiter::apply_preference(deck);
        tracing::debug!("mode reset to audio-only for track change");
        true
    }

    fn transition<P: MediaPipeline>(deck: &mut Deck<P>, target: PlaybackMode) -> ModeSwitch {
        if deck.session.mode == target {
            MuteArbiter::enforce(deck);
            return ModeSwitch::Unchanged;
        }

        let time = deck.active().current_time();
        let was_playing = deck.is_playing();
        let muted = deck.active().is_muted();
        deck.session.was_playing_before_transition = was_playing;

        deck.pause_all();

        let next: PipelineKind = target.active_pipeline();
        deck.pipeline_mut(next).set_current_time(time);

        deck.session.set_mode(target);
        deck.session.user_muted = muted;
        MuteArbiter::apply_preference(deck);

        tracing::info!(mode = ?target, time, was_playing, "playback mode switched");

        if !was_playing {
            return ModeSwitch::Switched { rejected: None };
        }

        let rejected = deck
            .active_mut()
            .play()
            .err()
            .map(|e| TransientPlaybackError::AutoplayRejected {
                pipeline: next,
                reason: e.reason,
            });
        if let Some(err) = &rejected {
            tracing::warn!(error = %err, "resume after mode switch was rejected");
        }
        ModeSwitch::Switched { rejected }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SimulatedPipeline;

    fn track(audio: bool, video: bool) -> Track {
        Track {
            id: "1".into(),
            title: "One".into(),
            chapter: Some(1),
            audio_uri: audio.then(|| "one.mp3".to_string()),
            video_uri: video.then(|| "one.mp4".to_string()),
            artwork_uri: None,
            playlist_name: "main".into(),
            duration_hint: None,
        }
    }

    fn loaded_deck() -> Deck<SimulatedPipeline> {
        let mut deck = Deck::new(
            SimulatedPipeline::new(PipelineKind::Audio),
            SimulatedPipeline::new(PipelineKind::Video),
        );
        deck.audio.load("one.mp3", 1);
        deck.video.load("one.mp4", 1);
        deck.audio.complete_load(200.0);
        deck.video.complete_load(200.0);
        MuteArbiter::establish_baseline(&mut deck);
        deck
    }

    #[test]
    fn immersive_switch_carries_position_and_play_state() {
        let mut deck = loaded_deck();
        deck.audio.play().unwrap();
        deck.audio.advance_playhead(42.0);

        let t = track(true, true);
        let outcome = PlaybackModeController::switch_to_immersive(&mut deck, Some(&t)).unwrap();
        assert_eq!(outcome, ModeSwitch::Switched { rejected: None });

        assert_eq!(deck.session.active, PipelineKind::Video);
        assert_eq!(deck.video.current_time(), 42.0);
        assert!(!deck.video.is_paused());
        assert!(deck.audio.is_paused());
        assert!(deck.audio.is_muted());
        assert!(!deck.video.is_muted());
        assert!(deck.session.was_playing_before_transition);
    }

    #[test]
    fn switching_twice_is_idempotent() {
        let mut deck = loaded_deck();
        let t = track(true, true);
        PlaybackModeController::switch_to_immersive(&mut deck, Some(&t)).unwrap();
        let again = PlaybackModeController::switch_to_immersive(&mut deck, Some(&t)).unwrap();
        assert_eq!(again, ModeSwitch::Unchanged);
        assert_eq!(deck.session.mode, PlaybackMode::Immersive);
        assert!(deck.audio.is_muted());
    }

    #[test]
    fn muted_preference_survives_the_switch() {
        let mut deck = loaded_deck();
        MuteArbiter::toggle(&mut deck);
        let t = track(true, true);
        PlaybackModeController::switch_to_immersive(&mut deck, Some(&t)).unwrap();
        assert!(deck.video.is_muted());
        assert!(deck.audio.is_muted());
    }

    #[test]
    fn missing_sources_are_content_errors() {
        let mut deck = loaded_deck();
        let audio_only = track(true, false);
        assert_eq!(
            PlaybackModeController::switch_to_immersive(&mut deck, Some(&audio_only)),
            Err(ContentError::NoImmersiveContent)
        );
        assert_eq!(deck.session.mode, PlaybackMode::AudioOnly);

        let video_only = track(false, true);
        assert_eq!(
            PlaybackModeController::switch_to_audio_only(&mut deck, Some(&video_only)),
            Err(ContentError::ImmersiveOnlyTrack)
        );
        assert_eq!(
            PlaybackModeController::switch_to_audio_only(&mut deck, None),
            Err(ContentError::NoTrackLoaded)
        );
    }

    #[test]
    fn rejected_resume_is_reported_not_raised() {
        let mut deck = loaded_deck();
        deck.audio.play().unwrap();
        deck.video.reject_play(Some("autoplay blocked"));

        let t = track(true, true);
        let outcome = PlaybackModeController::switch_to_immersive(&mut deck, Some(&t)).unwrap();
        assert!(matches!(
            outcome,
            ModeSwitch::Switched {
                rejected: Some(TransientPlaybackError::AutoplayRejected { .. })
            }
        ));
        assert!(deck.video.is_paused());
        assert!(deck.audio.is_paused());
    }

    #[test]
    fn reset_to_audio_only_does_not_resume() {
        let mut deck = loaded_deck();
        let t = track(true, true);
        deck.audio.play().unwrap();
        PlaybackModeController::switch_to_immersive(&mut deck, Some(&t)).unwrap();

        assert!(PlaybackModeController::reset_to_audio_only(&mut deck));
        assert_eq!(deck.session.active, PipelineKind::Audio);
        assert!(deck.audio.is_paused());
        assert!(deck.video.is_paused());
        assert!(deck.video.is_muted());
        assert!(!PlaybackModeController::reset_to_audio_only(&mut deck));
    }
}
