//! Assigns a track's sources to both pipelines.
//!
//! Every load bumps the generation. Pipelines are loaded with it, scheduled
//! tasks carry it, and the player drops anything tagged with an older one,
//! so the most recent load always wins without cancelling in-flight fetches.

use std::time::{Duration, Instant};

use crate::config::LoadingSettings;
use crate::error::{LoadError, PlayerError, TransientPlaybackError};
use crate::library::Track;
use crate::media::{MediaPipeline, PipelineKind};

use super::events::{Notifier, PlayerEvent, SceneCommand};
use super::mute::MuteArbiter;
use super::scheduler::{Scheduler, TaskKind};
use super::session::{Deck, PlaybackMode};

#[derive(Debug, Default, Clone)]
struct Slot {
    attempts: u32,
    failed: Option<String>,
}

pub struct TrackLoader {
    generation: u64,
    settings: LoadingSettings,
    track: Option<Track>,
    slots: [Slot; 2],
    resume_pending: bool,
    /// Playback was requested for this load and not paused since.
    autoplay: bool,
}

/// Append a random `cb` query parameter so caches along the way are bypassed.
pub fn cache_busted(uri: &str) -> String {
    let nonce: u32 = rand::random();
    let sep = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{sep}cb={nonce:08x}")
}

impl TrackLoader {
    pub fn new(settings: &LoadingSettings) -> Self {
        Self {
            generation: 0,
            settings: settings.clone(),
            track: None,
            slots: Default::default(),
            resume_pending: false,
            autoplay: false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The track most recently handed to [`Self::load`].
    pub fn current(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn resume_pending(&self) -> bool {
        self.resume_pending
    }

    pub fn is_failed(&self, kind: PipelineKind) -> bool {
        self.slots[kind.index()].failed.is_some()
    }

    pub fn attempts(&self, kind: PipelineKind) -> u32 {
        self.slots[kind.index()].attempts
    }

    /// `LoadError` if retries for this pipeline are exhausted.
    pub fn ensure_playable(&self, kind: PipelineKind) -> Result<(), LoadError> {
        let slot = &self.slots[kind.index()];
        match (&slot.failed, &self.track) {
            (Some(reason), Some(track)) => Err(LoadError {
                track_id: track.id.clone(),
                pipeline: kind,
                attempts: slot.attempts,
                reason: reason.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Load `track` into both pipelines and return the new generation.
    ///
    /// With `autoplay` set, playback starts right away when `warm` (the track
    /// is prefetched or already buffered), otherwise once the active pipeline
    /// reports ready or the fallback timer fires.
    #[allow(clippy::too_many_arguments)]
    pub fn load<P: MediaPipeline>(
        &mut self,
        deck: &mut Deck<P>,
        scheduler: &mut Scheduler,
        notifier: &Notifier,
        track: &Track,
        autoplay: bool,
        warm: bool,
        now: Instant,
    ) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        scheduler.cancel_all();
        self.slots = Default::default();
        self.resume_pending = false;
        self.autoplay = autoplay;

        deck.pause_all();

        for kind in PipelineKind::ALL {
            let pipeline = deck.pipeline_mut(kind);
            match track.source(kind) {
                Some(uri) => pipeline.load(uri, generation),
                None => pipeline.unload(generation),
            }
            if pipeline.current_time() != 0.0 {
                pipeline.set_current_time(0.0);
            }
        }

        deck.session.reset_for_load();
        let immersive_only = track.is_immersive_only();
        let mode = if immersive_only {
            PlaybackMode::Immersive
        } else {
            PlaybackMode::AudioOnly
        };
        deck.session.set_mode(mode);
        MuteArbiter::apply_preference(deck);

        self.track = Some(track.clone());
        tracing::info!(
            track_id = %track.id,
            generation,
            ?mode,
            autoplay,
            warm,
            "loading track"
        );

        notifier.emit(PlayerEvent::Scene(SceneCommand::SourceChanged {
            uri: track.video_uri.clone(),
        }));
        notifier.emit(PlayerEvent::ModeChanged {
            mode,
            can_exit_to_audio: !immersive_only,
        });
        if mode == PlaybackMode::Immersive {
            notifier.emit(PlayerEvent::Scene(SceneCommand::ResetHeading));
        }
        notifier.emit(PlayerEvent::ScrubberBounds {
            duration: track
                .duration_hint
                .unwrap_or(self.settings.provisional_duration_secs),
            provisional: true,
        });
        notifier.emit(PlayerEvent::Progress {
            current_time: 0.0,
            duration: None,
        });

        if autoplay {
            if warm || deck.active().ready_state().can_play() {
                self.start(deck, notifier);
            } else {
                self.resume_pending = true;
                scheduler.schedule(
                    TaskKind::ResumeFallback,
                    now + Duration::from_millis(self.settings.resume_fallback_ms),
                    generation,
                );
            }
        }

        generation
    }

    /// A pipeline reported it can play. Returns true if a pending resume ran.
    pub fn on_ready<P: MediaPipeline>(
        &mut self,
        kind: PipelineKind,
        deck: &mut Deck<P>,
        scheduler: &mut Scheduler,
        notifier: &Notifier,
    ) -> bool {
        self.slots[kind.index()] = Slot::default();

        if !self.resume_pending || kind != deck.session.active {
            return false;
        }
        self.resume_pending = false;
        scheduler.cancel(TaskKind::ResumeFallback);
        tracing::debug!(pipeline = %kind, "active pipeline ready, resuming");
        self.start(deck, notifier);
        true
    }

    /// Readiness never arrived in time: ask the host to play anyway.
    ///
    /// While a re-fetch of the active pipeline is pending the resume stays
    /// armed for its `CanPlay` instead.
    pub fn on_resume_fallback<P: MediaPipeline>(
        &mut self,
        deck: &mut Deck<P>,
        scheduler: &Scheduler,
        notifier: &Notifier,
    ) {
        let active = deck.session.active;
        if !self.resume_pending || self.is_failed(active) {
            self.resume_pending = false;
            return;
        }
        if scheduler.is_scheduled(TaskKind::LoadRetry(active)) {
            tracing::debug!(pipeline = %active, "resume deferred until re-fetch is ready");
            return;
        }
        self.resume_pending = false;
        tracing::debug!("readiness not reported in time, resuming anyway");
        self.start(deck, notifier);
    }

    pub fn cancel_resume(&mut self, scheduler: &mut Scheduler) {
        self.autoplay = false;
        if std::mem::take(&mut self.resume_pending) {
            scheduler.cancel(TaskKind::ResumeFallback);
        }
    }

    /// A pipeline failed to fetch or decode. Schedules a retry with backoff,
    /// or gives up with `LoadError` once retries are exhausted.
    pub fn on_error<P: MediaPipeline>(
        &mut self,
        kind: PipelineKind,
        message: &str,
        deck: &Deck<P>,
        scheduler: &mut Scheduler,
        now: Instant,
    ) -> Result<(), LoadError> {
        let Some(track) = &self.track else {
            return Ok(());
        };
        let attempts = {
            let slot = &mut self.slots[kind.index()];
            slot.attempts += 1;
            slot.attempts
        };

        if attempts <= self.settings.max_retries {
            let delay = self.backoff(attempts);
            tracing::warn!(
                track_id = %track.id,
                pipeline = %kind,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = message,
                "media load failed, retrying"
            );
            scheduler.schedule(TaskKind::LoadRetry(kind), now + delay, self.generation);
            return Ok(());
        }

        let err = LoadError {
            track_id: track.id.clone(),
            pipeline: kind,
            attempts,
            reason: message.to_string(),
        };
        self.slots[kind.index()].failed = Some(message.to_string());
        tracing::error!(error = %err, "giving up on media load");

        if kind == deck.session.active {
            self.cancel_resume(scheduler);
        }
        Err(err)
    }

    /// Re-fetch one pipeline's source under the current generation.
    ///
    /// Reloading pauses the pipeline, so a wanted playback on the active one
    /// resumes when the re-fetch reports ready.
    pub fn retry_pipeline<P: MediaPipeline>(&mut self, kind: PipelineKind, deck: &mut Deck<P>) {
        let Some(uri) = self.track.as_ref().and_then(|t| t.source(kind)) else {
            return;
        };
        let busted = cache_busted(uri);
        let resume = kind == deck.session.active
            && (self.autoplay || !deck.pipeline(kind).is_paused());
        let pipeline = deck.pipeline_mut(kind);
        let position = pipeline.current_time();
        tracing::debug!(
            pipeline = %kind,
            uri = %busted,
            attempt = self.attempts(kind),
            resume,
            "re-fetching media"
        );
        self.resume_pending |= resume;
        pipeline.load(&busted, self.generation);
        if position > 0.0 {
            pipeline.set_current_time(position);
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.settings.retry_backoff_ms;
        let exp = base.saturating_mul(1u64 << attempt.saturating_sub(1).min(16));
        let jitter = rand::random::<f64>() * base as f64 / 2.0;
        Duration::from_millis(exp) + Duration::from_secs_f64(jitter / 1000.0)
    }

    fn start<P: MediaPipeline>(&self, deck: &mut Deck<P>, notifier: &Notifier) {
        let kind = deck.session.active;
        if let Err(e) = deck.active_mut().play() {
            let err = TransientPlaybackError::AutoplayRejected {
                pipeline: kind,
                reason: e.reason,
            };
            tracing::warn!(error = %err, "autoplay rejected");
            notifier.notice(&PlayerError::from(err));
        }
    }
}
