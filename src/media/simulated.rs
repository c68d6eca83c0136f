//! In-process stand-ins for the host media stack.
//!
//! `SimulatedPipeline` behaves like a media element driven by a clock: loads
//! take a while, playback advances the playhead, reaching the end pauses and
//! reports `Ended`. Every state change queues the event a real host would
//! fire, tagged with the load generation current at that moment.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::{MediaEvent, MediaPipeline, PipelineKind, PlayRejected, PrefetchRequest, Prefetcher, ReadyState};

const TIME_UPDATE_EVERY: Duration = Duration::from_millis(250);

pub struct SimulatedPipeline {
    kind: PipelineKind,
    source: Option<String>,
    generation: u64,
    current_time: f64,
    duration: Option<f64>,
    paused: bool,
    muted: bool,
    ready_state: ReadyState,
    failed: bool,

    media_duration: f64,
    load_latency: Duration,
    reject_play: Option<String>,
    failing_sources: Vec<String>,

    loading_elapsed: Duration,
    since_time_update: Duration,
    last_step: Option<Instant>,
    loads: Vec<String>,
    pending: VecDeque<(u64, MediaEvent)>,
}

impl SimulatedPipeline {
    pub fn new(kind: PipelineKind) -> Self {
        Self {
            kind,
            source: None,
            generation: 0,
            current_time: 0.0,
            duration: None,
            paused: true,
            muted: false,
            ready_state: ReadyState::HaveNothing,
            failed: false,
            media_duration: 30.0,
            load_latency: Duration::from_millis(300),
            reject_play: None,
            failing_sources: Vec::new(),
            loading_elapsed: Duration::ZERO,
            since_time_update: Duration::ZERO,
            last_step: None,
            loads: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Duration every source reports once its metadata arrives.
    pub fn with_media_duration(mut self, seconds: f64) -> Self {
        self.media_duration = seconds;
        self
    }

    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    /// Sources containing `needle` fail to load until cleared.
    pub fn fail_sources_containing(&mut self, needle: impl Into<String>) {
        self.failing_sources.push(needle.into());
    }

    pub fn clear_failures(&mut self) {
        self.failing_sources.clear();
    }

    /// Make subsequent `play` calls fail with `reason`, or succeed with `None`.
    pub fn reject_play(&mut self, reason: Option<&str>) {
        self.reject_play = reason.map(str::to_string);
    }

    /// Every URI this pipeline was asked to load, in order.
    pub fn loads(&self) -> &[String] {
        &self.loads
    }

    /// Finish the in-flight load immediately with the given duration.
    pub fn complete_load(&mut self, duration: f64) {
        if self.source.is_none() {
            return;
        }
        self.duration = Some(duration);
        self.ready_state = ReadyState::HaveEnoughData;
        self.push(MediaEvent::LoadedMetadata { duration });
        self.push(MediaEvent::CanPlay);
    }

    /// Move the playhead as natural playback would, without a seek event.
    pub fn advance_playhead(&mut self, seconds: f64) {
        self.current_time = self.clamp(seconds);
    }

    pub fn take_events(&mut self) -> Vec<(u64, MediaEvent)> {
        self.pending.drain(..).collect()
    }

    /// Advance the simulated host clock to `now`.
    pub fn step(&mut self, now: Instant) {
        let dt = self
            .last_step
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last_step = Some(now);

        if self.source.is_some() && self.ready_state == ReadyState::HaveNothing && !self.failed {
            self.loading_elapsed += dt;
            if self.loading_elapsed >= self.load_latency {
                if self.is_failing_source() {
                    self.failed = true;
                    self.push(MediaEvent::Error {
                        message: "network error while fetching media".to_string(),
                    });
                } else {
                    self.complete_load(self.media_duration);
                }
            }
            return;
        }

        if self.paused || !self.ready_state.can_play() {
            return;
        }

        self.current_time += dt.as_secs_f64();
        self.since_time_update += dt;
        if self.since_time_update >= TIME_UPDATE_EVERY {
            self.since_time_update = Duration::ZERO;
            self.push(MediaEvent::TimeUpdate);
        }

        if let Some(duration) = self.duration {
            if self.current_time >= duration {
                self.current_time = duration;
                self.paused = true;
                self.push(MediaEvent::TimeUpdate);
                self.push(MediaEvent::Paused);
                self.push(MediaEvent::Ended);
            }
        }
    }

    fn is_failing_source(&self) -> bool {
        self.source
            .as_deref()
            .is_some_and(|src| self.failing_sources.iter().any(|n| src.contains(n.as_str())))
    }

    fn clamp(&self, seconds: f64) -> f64 {
        let upper = self.duration.unwrap_or(f64::INFINITY);
        seconds.max(0.0).min(upper)
    }

    fn push(&mut self, event: MediaEvent) {
        self.pending.push_back((self.generation, event));
    }

    fn reset_media(&mut self, generation: u64) {
        self.generation = generation;
        self.current_time = 0.0;
        self.duration = None;
        self.ready_state = ReadyState::HaveNothing;
        self.failed = false;
        self.loading_elapsed = Duration::ZERO;
        self.since_time_update = Duration::ZERO;
        if !self.paused {
            self.paused = true;
            self.push(MediaEvent::Paused);
        }
    }
}

impl MediaPipeline for SimulatedPipeline {
    fn kind(&self) -> PipelineKind {
        self.kind
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn load(&mut self, uri: &str, generation: u64) {
        self.reset_media(generation);
        self.source = Some(uri.to_string());
        self.loads.push(uri.to_string());
    }

    fn unload(&mut self, generation: u64) {
        self.reset_media(generation);
        self.source = None;
    }

    fn load_generation(&self) -> u64 {
        self.generation
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.current_time = self.clamp(seconds);
        if self.source.is_some() {
            self.push(MediaEvent::Seeked);
        }
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn play(&mut self) -> Result<(), PlayRejected> {
        if let Some(reason) = &self.reject_play {
            return Err(PlayRejected {
                reason: reason.clone(),
            });
        }
        if self.source.is_none() {
            return Err(PlayRejected {
                reason: "no source loaded".to_string(),
            });
        }
        if self.paused {
            self.paused = false;
            self.push(MediaEvent::Playing);
        }
        Ok(())
    }

    fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.push(MediaEvent::Paused);
        }
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        if self.muted != muted {
            self.muted = muted;
            self.push(MediaEvent::VolumeChange);
        }
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }
}

/// A prefetcher that completes every request after a fixed latency.
pub struct SimulatedFetcher {
    latency: Duration,
    failing_sources: Vec<String>,
    requests: Vec<PrefetchRequest>,
    in_flight: Vec<(PrefetchRequest, Option<Instant>)>,
}

impl SimulatedFetcher {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failing_sources: Vec::new(),
            requests: Vec::new(),
            in_flight: Vec::new(),
        }
    }

    pub fn fail_sources_containing(&mut self, needle: impl Into<String>) {
        self.failing_sources.push(needle.into());
    }

    /// Every request ever made, in order.
    pub fn requests(&self) -> &[PrefetchRequest] {
        &self.requests
    }

    /// Requests whose latency has elapsed by `now`, with their outcome.
    pub fn step(&mut self, now: Instant) -> Vec<(u64, Result<(), String>)> {
        let mut done = Vec::new();
        let latency = self.latency;
        let failing = &self.failing_sources;
        self.in_flight.retain_mut(|(request, started)| {
            let started = *started.get_or_insert(now);
            if now.saturating_duration_since(started) < latency {
                return true;
            }
            let outcome = if failing.iter().any(|n| request.uri.contains(n.as_str())) {
                Err(format!("prefetch of {} failed", request.uri))
            } else {
                Ok(())
            };
            done.push((request.ticket, outcome));
            false
        });
        done
    }
}

impl Prefetcher for SimulatedFetcher {
    fn prefetch(&mut self, request: PrefetchRequest) {
        self.requests.push(request.clone());
        self.in_flight.push((request, None));
    }
}
