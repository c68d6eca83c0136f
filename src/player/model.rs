use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::error::{ContentError, PlayerError, SequencingError, TransientPlaybackError};
use crate::library::{Cursor, Playlist, Track};
use crate::media::{MediaEvent, MediaPipeline, PipelineKind, Prefetcher};

use super::events::{Command, Notifier, PlayerEvent, SceneCommand};
use super::loader::TrackLoader;
use super::mode::{ModeSwitch, PlaybackModeController};
use super::mute::MuteArbiter;
use super::preload::PreloadManager;
use super::scheduler::{Scheduler, TaskKind};
use super::sequencer::{EndSignal, PlaylistSequencer, Previous, is_near_end};
use super::session::{Deck, PlaybackMode, PlaybackSession};
use super::sync::DualTrackSynchronizer;

/// The playback core: two pipelines, one playlist, one session.
///
/// Everything is driven from outside through [`Player::handle_media`],
/// [`Player::dispatch`], [`Player::handle_preload`] and
/// [`Player::poll_timers`]. Each call runs to completion; the player never
/// blocks or spawns.
pub struct Player<P, F> {
    deck: Deck<P>,
    playlist: Playlist,
    sequencer: PlaylistSequencer,
    loader: TrackLoader,
    sync: DualTrackSynchronizer,
    preload: PreloadManager<F>,
    scheduler: Scheduler,
    settings: Settings,
    notifier: Notifier,
    seek_target: Option<f64>,
}

impl<P: MediaPipeline, F: Prefetcher> Player<P, F> {
    pub fn new(
        audio: P,
        video: P,
        fetcher: F,
        playlist: Playlist,
        settings: &Settings,
        events: Sender<PlayerEvent>,
    ) -> Self {
        Self {
            deck: Deck::new(audio, video),
            playlist,
            sequencer: PlaylistSequencer::new(&settings.sequencing),
            loader: TrackLoader::new(&settings.loading),
            sync: DualTrackSynchronizer::new(&settings.sync),
            preload: PreloadManager::new(fetcher, &settings.preload),
            scheduler: Scheduler::default(),
            settings: settings.clone(),
            notifier: Notifier::new(events, settings.notices.clone()),
            seek_target: None,
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.deck.session
    }

    pub fn mode(&self) -> PlaybackMode {
        self.deck.session.mode
    }

    pub fn pipeline(&self, kind: PipelineKind) -> &P {
        self.deck.pipeline(kind)
    }

    /// Direct access for hosts that drive the pipelines (stepping clocks,
    /// draining events).
    pub fn pipeline_mut(&mut self, kind: PipelineKind) -> &mut P {
        self.deck.pipeline_mut(kind)
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn position(&self) -> Option<Cursor> {
        self.sequencer.position()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.loader.current()
    }

    pub fn generation(&self) -> u64 {
        self.loader.generation()
    }

    pub fn is_playing(&self) -> bool {
        self.deck.is_playing()
    }

    /// When [`Self::poll_timers`] next has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn is_scheduled(&self, kind: TaskKind) -> bool {
        self.scheduler.is_scheduled(kind)
    }

    pub fn preload(&self) -> &PreloadManager<F> {
        &self.preload
    }

    pub fn preload_mut(&mut self) -> &mut PreloadManager<F> {
        &mut self.preload
    }

    /// Load the first track of the first sub-playlist, paused.
    pub fn start(&mut self, now: Instant) -> Result<(), PlayerError> {
        let cursor = self.playlist.first().ok_or(SequencingError::EmptyPlaylist)?;
        self.load_cursor(cursor, false, now)
    }

    /// Run a command and turn any failure into a logged notice.
    pub fn dispatch(&mut self, command: Command, now: Instant) {
        tracing::debug!(?command, "command");
        if let Err(e) = self.handle_command(command, now) {
            match &e {
                PlayerError::Sequencing(_) | PlayerError::Content(_) => {
                    tracing::info!(error = %e, "command not applied")
                }
                _ => tracing::warn!(error = %e, "command failed"),
            }
            self.notifier.notice(&e);
        }
    }

    pub fn handle_command(&mut self, command: Command, now: Instant) -> Result<(), PlayerError> {
        match command {
            Command::SwitchToAudio => self.switch_to_audio_only(),
            Command::SwitchToImmersive => self.switch_to_immersive(),
            Command::Next => self.next(now),
            Command::Previous => self.previous(now),
            Command::SelectTrack(id) => self.select_track(&id, now),
            Command::ToggleMute => {
                self.toggle_mute();
                Ok(())
            }
            Command::BeginScrub => {
                self.begin_scrub();
                Ok(())
            }
            Command::Scrub(position) => self.scrub(position, now),
            Command::Play => self.play(),
            Command::Pause => {
                self.pause();
                Ok(())
            }
            Command::TogglePlay => self.toggle_play(),
            Command::Retry => self.retry(now),
        }
    }

    pub fn switch_to_immersive(&mut self) -> Result<(), PlayerError> {
        if self.current_track().is_some_and(Track::has_video) {
            self.loader.ensure_playable(PipelineKind::Video)?;
        }
        let outcome =
            PlaybackModeController::switch_to_immersive(&mut self.deck, self.loader.current())?;
        self.after_mode_switch(outcome);
        Ok(())
    }

    pub fn switch_to_audio_only(&mut self) -> Result<(), PlayerError> {
        let outcome =
            PlaybackModeController::switch_to_audio_only(&mut self.deck, self.loader.current())?;
        self.after_mode_switch(outcome);
        Ok(())
    }

    fn after_mode_switch(&mut self, outcome: ModeSwitch) {
        let ModeSwitch::Switched { rejected } = outcome else {
            return;
        };
        let mode = self.deck.session.mode;
        let can_exit_to_audio = self.current_track().is_some_and(Track::has_audio);
        self.notifier.emit(PlayerEvent::ModeChanged {
            mode,
            can_exit_to_audio,
        });
        if mode == PlaybackMode::Immersive {
            self.notifier.emit(PlayerEvent::Scene(SceneCommand::ResetHeading));
        }
        self.notifier.emit(PlayerEvent::MuteChanged {
            muted: self.deck.active().is_muted(),
        });
        self.emit_progress();

        if let Some(err) = rejected {
            self.notifier.emit(PlayerEvent::PlaybackChanged { playing: false });
            self.notifier.notice(&err.into());
        }
    }

    pub fn next(&mut self, now: Instant) -> Result<(), PlayerError> {
        let cursor = self.sequencer.next_cursor(&self.playlist)?;
        let autoplay = self.wants_playback();
        self.change_track(cursor, autoplay, now)
    }

    /// Restart the current track past the grace period, otherwise step back.
    /// On the first track this restarts and still reports `StartOfPlaylist`.
    pub fn previous(&mut self, now: Instant) -> Result<(), PlayerError> {
        let time = self.deck.active().current_time();
        match self.sequencer.previous_target(&self.playlist, time) {
            Ok(Previous::Restart) => {
                self.restart(now);
                Ok(())
            }
            Ok(Previous::MoveTo(cursor)) => {
                let autoplay = self.wants_playback();
                self.change_track(cursor, autoplay, now)
            }
            Err(SequencingError::StartOfPlaylist) => {
                self.restart(now);
                Err(SequencingError::StartOfPlaylist.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn select_track(&mut self, track_id: &str, now: Instant) -> Result<(), PlayerError> {
        let cursor = self.sequencer.select(&self.playlist, track_id)?;
        let autoplay = self.wants_playback();
        self.change_track(cursor, autoplay, now)
    }

    pub fn toggle_mute(&mut self) -> bool {
        let muted = MuteArbiter::toggle(&mut self.deck);
        tracing::debug!(muted, "mute toggled");
        self.notifier.emit(PlayerEvent::MuteChanged { muted });
        muted
    }

    /// The user grabbed the scrubber: progress updates stop until release.
    pub fn begin_scrub(&mut self) {
        self.deck.session.is_scrubbing = true;
    }

    /// The user released the scrubber at `position` seconds.
    pub fn scrub(&mut self, position: f64, now: Instant) -> Result<(), PlayerError> {
        self.deck.session.is_scrubbing = false;
        if self.loader.current().is_none() {
            return Err(ContentError::NoTrackLoaded.into());
        }

        let duration = self.deck.active().duration();
        let target = position.max(0.0).min(duration.unwrap_or(f64::INFINITY));
        let autoplay = self.wants_playback();
        self.seek(target, now);

        if is_near_end(target, duration, self.settings.sequencing.scrub_end_epsilon_secs) {
            self.advance(EndSignal::ScrubToEnd, autoplay, now);
        }
        Ok(())
    }

    pub fn play(&mut self) -> Result<(), PlayerError> {
        if self.loader.current().is_none() {
            return Err(ContentError::NoTrackLoaded.into());
        }
        let active = self.deck.session.active;
        self.loader.ensure_playable(active)?;

        if self.deck.session.advance_triggered {
            // Ended at the close of the sub-playlist: play again from the top.
            self.deck.session.advance_triggered = false;
            self.deck.active_mut().set_current_time(0.0);
            self.sync.propagate_seek(&mut self.deck);
        }

        self.deck.active_mut().play().map_err(|e| {
            TransientPlaybackError::AutoplayRejected {
                pipeline: active,
                reason: e.reason,
            }
            .into()
        })
    }

    pub fn pause(&mut self) {
        self.loader.cancel_resume(&mut self.scheduler);
        let active = self.deck.active_mut();
        if !active.is_paused() {
            active.pause();
        }
        self.sync.mirror_pause(&mut self.deck);
    }

    pub fn toggle_play(&mut self) -> Result<(), PlayerError> {
        if self.wants_playback() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Reload the current track from scratch and play it.
    pub fn retry(&mut self, now: Instant) -> Result<(), PlayerError> {
        let cursor = self.sequencer.position().ok_or(ContentError::NoTrackLoaded)?;
        tracing::info!(?cursor, "retrying current track");
        self.load_cursor(cursor, true, now)
    }

    /// Record the outcome of a prefetch request.
    pub fn handle_preload(&mut self, ticket: u64, outcome: Result<(), String>) {
        self.preload.complete(ticket, outcome);
    }

    /// React to one pipeline event. Events from an older load are dropped.
    pub fn handle_media(
        &mut self,
        kind: PipelineKind,
        generation: u64,
        event: MediaEvent,
        now: Instant,
    ) {
        if generation != self.loader.generation() {
            tracing::trace!(pipeline = %kind, generation, ?event, "stale media event");
            return;
        }
        let is_active = kind == self.deck.session.active;

        match event {
            MediaEvent::LoadedMetadata { duration } => {
                tracing::debug!(pipeline = %kind, duration, "metadata loaded");
                if is_active {
                    self.notifier.emit(PlayerEvent::ScrubberBounds {
                        duration,
                        provisional: false,
                    });
                }
            }
            MediaEvent::CanPlay => {
                self.loader
                    .on_ready(kind, &mut self.deck, &mut self.scheduler, &self.notifier);
                if !is_active && self.deck.is_playing() {
                    self.sync.mirror_play(&mut self.deck);
                }
            }
            MediaEvent::Playing => self.on_playing(kind, is_active, now),
            MediaEvent::Paused => {
                if is_active && self.deck.active().is_paused() {
                    self.sync.mirror_pause(&mut self.deck);
                    self.scheduler.cancel(TaskKind::DriftCheck);
                    self.scheduler.cancel(TaskKind::EndPoll);
                    self.notifier.emit(PlayerEvent::PlaybackChanged { playing: false });
                }
            }
            MediaEvent::Seeked => {
                if is_active {
                    self.deck.session.is_seeking = false;
                    self.seek_target = None;
                    self.scheduler.cancel(TaskKind::SeekTimeout);
                    self.sync.propagate_seek(&mut self.deck);
                    self.emit_progress();
                }
            }
            MediaEvent::TimeUpdate => {
                if is_active && !self.deck.session.is_scrubbing {
                    self.emit_progress();
                }
            }
            MediaEvent::VolumeChange => {
                if MuteArbiter::enforce(&mut self.deck) {
                    tracing::debug!(pipeline = %kind, "shadow pipeline was unmuted, re-muted");
                }
                if is_active {
                    self.notifier.emit(PlayerEvent::MuteChanged {
                        muted: self.deck.active().is_muted(),
                    });
                }
            }
            MediaEvent::Ended => {
                if is_active {
                    self.advance(EndSignal::NativeEnded, true, now);
                }
            }
            MediaEvent::Error { message } => {
                if let Err(e) =
                    self.loader
                        .on_error(kind, &message, &self.deck, &mut self.scheduler, now)
                {
                    self.notifier.notice(&e.into());
                }
            }
            MediaEvent::PlayRejected { reason } => {
                if is_active {
                    let err = TransientPlaybackError::AutoplayRejected {
                        pipeline: kind,
                        reason,
                    };
                    tracing::warn!(error = %err, "play request rejected");
                    self.sync.mirror_pause(&mut self.deck);
                    self.notifier.emit(PlayerEvent::PlaybackChanged { playing: false });
                    self.notifier.notice(&err.into());
                } else {
                    tracing::debug!(pipeline = %kind, %reason, "shadow play rejected");
                }
            }
        }
    }

    /// Run every scheduled task due at `now`.
    pub fn poll_timers(&mut self, now: Instant) {
        for task in self.scheduler.take_due(now) {
            if task.generation != self.loader.generation() {
                tracing::trace!(task = task.kind.name(), generation = task.generation, "dropping stale task");
                continue;
            }
            match task.kind {
                TaskKind::DriftCheck => {
                    self.sync.correct(&mut self.deck);
                    if self.deck.is_playing() {
                        self.scheduler.schedule(
                            TaskKind::DriftCheck,
                            now + self.sync.interval(),
                            task.generation,
                        );
                    }
                }
                TaskKind::EndPoll => self.poll_end(task.generation, now),
                TaskKind::ResumeFallback => {
                    self.loader
                        .on_resume_fallback(&mut self.deck, &self.scheduler, &self.notifier);
                }
                TaskKind::LoadRetry(kind) => self.loader.retry_pipeline(kind, &mut self.deck),
                TaskKind::SeekTimeout => {
                    if std::mem::take(&mut self.deck.session.is_seeking) {
                        let target = self.seek_target.take().unwrap_or_default();
                        let err = TransientPlaybackError::SeekTimeout { target };
                        tracing::warn!(error = %err, "seek did not settle");
                        self.notifier.notice(&err.into());
                    }
                }
            }
        }
    }

    fn poll_end(&mut self, generation: u64, now: Instant) {
        let session = &self.deck.session;
        if !self.deck.is_playing() || session.is_seeking || session.is_scrubbing {
            return;
        }
        let active = self.deck.active();
        if is_near_end(
            active.current_time(),
            active.duration(),
            self.settings.sequencing.end_epsilon_secs,
        ) {
            self.advance(EndSignal::NearEndPoll, true, now);
        }
        if generation == self.loader.generation() && self.deck.is_playing() {
            self.scheduler.schedule(
                TaskKind::EndPoll,
                now + self.end_poll_interval(),
                generation,
            );
        }
    }

    fn on_playing(&mut self, kind: PipelineKind, is_active: bool, now: Instant) {
        if !is_active {
            MuteArbiter::enforce(&mut self.deck);
            if self.deck.active().is_paused() {
                let shadow = self.deck.pipeline_mut(kind);
                if !shadow.is_paused() {
                    tracing::debug!(pipeline = %kind, "shadow started while active paused, pausing");
                    shadow.pause();
                }
            }
            return;
        }
        if self.deck.active().is_paused() {
            return;
        }

        if self.deck.session.is_first_play {
            MuteArbiter::establish_baseline(&mut self.deck);
            self.notifier.emit(PlayerEvent::MuteChanged {
                muted: self.deck.active().is_muted(),
            });
        } else {
            MuteArbiter::enforce(&mut self.deck);
        }
        self.sync.mirror_play(&mut self.deck);

        let generation = self.loader.generation();
        if !self.scheduler.is_scheduled(TaskKind::DriftCheck) {
            self.scheduler
                .schedule(TaskKind::DriftCheck, now + self.sync.interval(), generation);
        }
        if !self.scheduler.is_scheduled(TaskKind::EndPoll) {
            self.scheduler
                .schedule(TaskKind::EndPoll, now + self.end_poll_interval(), generation);
        }
        self.notifier.emit(PlayerEvent::PlaybackChanged { playing: true });
    }

    /// The single end-of-track entry point.
    fn advance(&mut self, signal: EndSignal, autoplay: bool, now: Instant) {
        if !PlaylistSequencer::claim_advance(&mut self.deck.session, signal) {
            return;
        }
        match self.sequencer.next_cursor(&self.playlist) {
            Ok(cursor) => {
                if let Err(e) = self.change_track(cursor, autoplay, now) {
                    tracing::warn!(error = %e, "auto-advance failed");
                    self.notifier.notice(&e);
                }
            }
            Err(SequencingError::EndOfPlaylist) => {
                tracing::info!("reached the end of the sub-playlist");
                self.loader.cancel_resume(&mut self.scheduler);
                self.deck.pause_all();
                self.scheduler.cancel(TaskKind::EndPoll);
                self.scheduler.cancel(TaskKind::DriftCheck);
                self.notifier
                    .notice(&SequencingError::EndOfPlaylist.into());
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot advance");
            }
        }
    }

    fn change_track(&mut self, cursor: Cursor, autoplay: bool, now: Instant) -> Result<(), PlayerError> {
        PlaybackModeController::reset_to_audio_only(&mut self.deck);
        self.load_cursor(cursor, autoplay, now)
    }

    fn load_cursor(&mut self, cursor: Cursor, autoplay: bool, now: Instant) -> Result<(), PlayerError> {
        let track = self
            .playlist
            .track(cursor)
            .cloned()
            .ok_or(SequencingError::EmptyPlaylist)?;

        self.sequencer.set_position(cursor);
        self.seek_target = None;
        let warm = self.preload.is_ready(&track);
        self.loader.load(
            &mut self.deck,
            &mut self.scheduler,
            &self.notifier,
            &track,
            autoplay,
            warm,
            now,
        );

        self.notifier.emit(PlayerEvent::TrackChanged {
            track_id: track.id.clone(),
            title: track.title.clone(),
            playlist: track.playlist_name.clone(),
            index: cursor.index,
            count: self.playlist.group_len(cursor),
        });

        let mut window = vec![&track];
        window.extend(self.playlist.following(cursor, self.preload.lookahead()));
        self.preload.warm(&window);
        Ok(())
    }

    fn restart(&mut self, now: Instant) {
        self.deck.session.advance_triggered = false;
        self.seek(0.0, now);
    }

    fn seek(&mut self, target: f64, now: Instant) {
        self.deck.session.is_seeking = true;
        self.seek_target = Some(target);
        self.deck.active_mut().set_current_time(target);
        self.sync.propagate_seek(&mut self.deck);
        self.scheduler.schedule(
            TaskKind::SeekTimeout,
            now + Duration::from_millis(self.settings.loading.seek_timeout_ms),
            self.loader.generation(),
        );
        self.emit_progress();
    }

    /// Playing now, or about to once the pending resume runs.
    fn wants_playback(&self) -> bool {
        self.deck.is_playing() || self.loader.resume_pending()
    }

    fn end_poll_interval(&self) -> Duration {
        Duration::from_millis(self.settings.sequencing.end_poll_interval_ms)
    }

    fn emit_progress(&self) {
        let active = self.deck.active();
        self.notifier.emit(PlayerEvent::Progress {
            current_time: active.current_time(),
            duration: active.duration(),
        });
    }
}
