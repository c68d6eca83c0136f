//! Single-unmuted-pipeline rule.
//!
//! Only the active pipeline may be audible. Every mute change below mutes the
//! shadow before it touches the active pipeline, so there is no moment in
//! which both are unmuted.

use crate::media::MediaPipeline;

use super::session::Deck;

pub struct MuteArbiter;

impl MuteArbiter {
    /// Mute the shadow pipeline. Returns true if it had to be corrected.
    pub fn enforce<P: MediaPipeline>(deck: &mut Deck<P>) -> bool {
        let shadow = deck.shadow_mut();
        if shadow.is_muted() {
            return false;
        }
        let kind = shadow.kind();
        shadow.set_muted(true);
        tracing::debug!(pipeline = %kind, "muted shadow pipeline");
        true
    }

    /// First-ever playback: set both flags explicitly instead of trusting
    /// whatever the host initialised them to.
    pub fn establish_baseline<P: MediaPipeline>(deck: &mut Deck<P>) {
        deck.shadow_mut().set_muted(true);
        let muted = deck.session.user_muted;
        deck.active_mut().set_muted(muted);
        deck.session.is_first_play = false;
        tracing::debug!(active = %deck.session.active, muted, "mute baseline established");
    }

    /// Apply the user's mute preference to the active pipeline, shadow first.
    pub fn apply_preference<P: MediaPipeline>(deck: &mut Deck<P>) {
        Self::enforce(deck);
        let muted = deck.session.user_muted;
        let active = deck.active_mut();
        if active.is_muted() != muted {
            active.set_muted(muted);
        }
    }

    /// Flip the active pipeline's mute flag. The shadow stays muted.
    pub fn toggle<P: MediaPipeline>(deck: &mut Deck<P>) -> bool {
        deck.session.user_muted = !deck.active().is_muted();
        Self::apply_preference(deck);
        deck.session.user_muted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{PipelineKind, SimulatedPipeline};
    use crate::player::session::PlaybackMode;

    fn deck() -> Deck<SimulatedPipeline> {
        let mut deck = Deck::new(
            SimulatedPipeline::new(PipelineKind::Audio),
            SimulatedPipeline::new(PipelineKind::Video),
        );
        deck.audio.load("a.mp3", 1);
        deck.video.load("v.mp4", 1);
        deck
    }

    fn exclusive(deck: &Deck<SimulatedPipeline>) -> bool {
        deck.audio.is_muted() || deck.video.is_muted()
    }

    #[test]
    fn enforce_mutes_only_the_shadow() {
        let mut deck = deck();
        assert!(!exclusive(&deck));
        assert!(MuteArbiter::enforce(&mut deck));
        assert!(!deck.audio.is_muted());
        assert!(deck.video.is_muted());
        assert!(!MuteArbiter::enforce(&mut deck));
    }

    #[test]
    fn toggle_never_unmutes_the_shadow() {
        let mut deck = deck();
        MuteArbiter::establish_baseline(&mut deck);
        assert!(!deck.session.is_first_play);

        assert!(MuteArbiter::toggle(&mut deck));
        assert!(deck.audio.is_muted());
        assert!(deck.video.is_muted());

        assert!(!MuteArbiter::toggle(&mut deck));
        assert!(!deck.audio.is_muted());
        assert!(deck.video.is_muted());
    }

    #[test]
    fn preference_follows_the_active_pipeline() {
        let mut deck = deck();
        MuteArbiter::establish_baseline(&mut deck);

        deck.session.set_mode(PlaybackMode::Immersive);
        MuteArbiter::apply_preference(&mut deck);
        assert!(deck.audio.is_muted());
        assert!(!deck.video.is_muted());
        assert!(exclusive(&deck));
    }
}
