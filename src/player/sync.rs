//! Keeps the shadow pipeline's playhead within a bounded drift of the active one.
//!
//! Three mechanisms cooperate: settled seeks on the active pipeline are
//! copied over, play/pause is mirrored (the shadow plays muted so its buffer
//! stays warm), and a periodic check corrects the shadow once drift exceeds
//! the tolerance. None of them ever unmutes the shadow.

use std::time::Duration;

use crate::config::SyncSettings;
use crate::media::MediaPipeline;

use super::session::Deck;

/// Result of one periodic drift check.
#[derive(Debug, Clone, PartialEq)]
pub enum DriftCheck {
    /// Nothing to compare: the active pipeline is paused or the shadow has no source.
    Idle,
    InSync { drift: f64 },
    Corrected { drift: f64, target: f64 },
    /// Drift exceeded the tolerance but the target lies past a known duration.
    Skipped { drift: f64, target: f64 },
}

pub struct DualTrackSynchronizer {
    tolerance: f64,
    interval: Duration,
}

fn within_known_duration<P: MediaPipeline>(pipeline: &P, target: f64) -> bool {
    pipeline.duration().is_some_and(|d| target <= d)
}

impl DualTrackSynchronizer {
    pub fn new(settings: &SyncSettings) -> Self {
        Self {
            tolerance: settings.drift_tolerance_secs,
            interval: Duration::from_millis(settings.correction_interval_ms),
        }
    }

    /// Cadence of [`Self::correct`] while playing.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Copy the active pipeline's settled seek position to the shadow.
    ///
    /// A shadow without metadata accepts the position as its start point; one
    /// with a known duration is never sent past it.
    pub fn propagate_seek<P: MediaPipeline>(&self, deck: &mut Deck<P>) -> bool {
        let target = deck.active().current_time();
        let shadow = deck.shadow_mut();
        if !shadow.has_source() {
            return false;
        }
        if shadow.duration().is_some_and(|d| target > d) {
            tracing::debug!(target, pipeline = %shadow.kind(), "seek past shadow duration, not propagated");
            return false;
        }
        if (shadow.current_time() - target).abs() > f64::EPSILON {
            shadow.set_current_time(target);
        }
        true
    }

    /// The active pipeline started: align the shadow and let it play muted.
    pub fn mirror_play<P: MediaPipeline>(&self, deck: &mut Deck<P>) {
        if !deck.shadow().has_source() {
            return;
        }
        self.propagate_seek(deck);

        let shadow = deck.shadow_mut();
        if !shadow.is_muted() {
            shadow.set_muted(true);
        }
        if shadow.is_paused() {
            if let Err(e) = shadow.play() {
                // The shadow only warms its buffer; a refusal is not user-facing.
                tracing::debug!(pipeline = %shadow.kind(), error = %e, "shadow pipeline refused to play");
            }
        }
    }

    /// The active pipeline paused: the shadow follows.
    pub fn mirror_pause<P: MediaPipeline>(&self, deck: &mut Deck<P>) {
        let shadow = deck.shadow_mut();
        if !shadow.is_paused() {
            shadow.pause();
        }
    }

    /// One periodic correction step.
    pub fn correct<P: MediaPipeline>(&self, deck: &mut Deck<P>) -> DriftCheck {
        if deck.active().is_paused() || !deck.shadow().has_source() {
            return DriftCheck::Idle;
        }

        let target = deck.active().current_time();
        let drift = (target - deck.shadow().current_time()).abs();
        if drift <= self.tolerance {
            return DriftCheck::InSync { drift };
        }

        if !within_known_duration(deck.active(), target) || !within_known_duration(deck.shadow(), target) {
            tracing::debug!(
                drift,
                target,
                tolerance = self.tolerance,
                "drift correction skipped, target outside known duration"
            );
            return DriftCheck::Skipped { drift, target };
        }

        let shadow = deck.shadow_mut();
        shadow.set_current_time(target);
        tracing::debug!(drift, target, pipeline = %shadow.kind(), "corrected shadow drift");
        DriftCheck::Corrected { drift, target }
    }
}
