//! Speculative warm-up of upcoming tracks.
//!
//! Each source of the current and the next `lookahead` tracks is requested
//! once through the [`Prefetcher`]. Completions come back by ticket; entries
//! that fall out of the window are dropped, so a late completion for them is
//! simply ignored.

use std::collections::HashMap;

use crate::config::PreloadSettings;
use crate::library::Track;
use crate::media::{PipelineKind, PrefetchRequest, Prefetcher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreloadState {
    Pending,
    Ready,
    Failed(String),
}

#[derive(Debug)]
struct Entry {
    ticket: u64,
    state: PreloadState,
}

pub struct PreloadManager<F> {
    fetcher: F,
    enabled: bool,
    lookahead: usize,
    next_ticket: u64,
    entries: HashMap<(String, PipelineKind), Entry>,
}

impl<F: Prefetcher> PreloadManager<F> {
    pub fn new(fetcher: F, settings: &PreloadSettings) -> Self {
        Self {
            fetcher,
            enabled: settings.enabled,
            lookahead: settings.lookahead,
            next_ticket: 0,
            entries: HashMap::new(),
        }
    }

    /// How many tracks after the current one are kept warm.
    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// Make `window` the set of warm tracks: request whatever is missing and
    /// evict everything else.
    pub fn warm(&mut self, window: &[&Track]) {
        if !self.enabled {
            return;
        }

        let before = self.entries.len();
        self.entries
            .retain(|(id, _), _| window.iter().any(|t| &t.id == id));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "evicted preload entries outside the window");
        }

        for track in window {
            for kind in PipelineKind::ALL {
                let Some(uri) = track.source(kind) else {
                    continue;
                };
                let key = (track.id.clone(), kind);
                if self.entries.contains_key(&key) {
                    continue;
                }
                self.next_ticket += 1;
                let ticket = self.next_ticket;
                self.entries.insert(
                    key,
                    Entry {
                        ticket,
                        state: PreloadState::Pending,
                    },
                );
                tracing::debug!(track_id = %track.id, pipeline = %kind, ticket, "prefetch requested");
                self.fetcher.prefetch(PrefetchRequest {
                    ticket,
                    track_id: track.id.clone(),
                    pipeline: kind,
                    uri: uri.to_string(),
                });
            }
        }
    }

    /// Record a prefetch outcome. Returns false for unknown or evicted tickets.
    pub fn complete(&mut self, ticket: u64, outcome: Result<(), String>) -> bool {
        let Some(((track_id, kind), entry)) = self
            .entries
            .iter_mut()
            .find(|(_, e)| e.ticket == ticket)
        else {
            tracing::trace!(ticket, "ignoring completion for evicted prefetch");
            return false;
        };

        entry.state = match outcome {
            Ok(()) => PreloadState::Ready,
            Err(reason) => {
                tracing::debug!(%track_id, pipeline = %kind, %reason, "prefetch failed");
                PreloadState::Failed(reason)
            }
        };
        true
    }

    /// True once every source the track has is warm.
    pub fn is_ready(&self, track: &Track) -> bool {
        let mut sources = PipelineKind::ALL
            .into_iter()
            .filter(|k| track.source(*k).is_some())
            .peekable();
        if sources.peek().is_none() {
            return false;
        }
        sources.all(|k| self.state(&track.id, k) == Some(&PreloadState::Ready))
    }

    pub fn state(&self, track_id: &str, kind: PipelineKind) -> Option<&PreloadState> {
        self.entries
            .get(&(track_id.to_string(), kind))
            .map(|e| &e.state)
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SimulatedFetcher;
    use std::time::{Duration, Instant};

    fn track(id: &str, video: bool) -> Track {
        Track {
            id: id.into(),
            title: id.into(),
            chapter: None,
            audio_uri: Some(format!("{id}.mp3")),
            video_uri: video.then(|| format!("{id}.mp4")),
            artwork_uri: None,
            playlist_name: "main".into(),
            duration_hint: None,
        }
    }

    fn manager() -> PreloadManager<SimulatedFetcher> {
        PreloadManager::new(
            SimulatedFetcher::new(Duration::from_millis(100)),
            &PreloadSettings::default(),
        )
    }

    fn drain(manager: &mut PreloadManager<SimulatedFetcher>, now: Instant) {
        manager.fetcher_mut().step(now);
        for (ticket, outcome) in manager.fetcher_mut().step(now + Duration::from_secs(1)) {
            manager.complete(ticket, outcome);
        }
    }

    #[test]
    fn track_is_ready_only_when_every_source_is_warm() {
        let mut m = manager();
        let a = track("a", true);
        m.warm(&[&a]);
        assert_eq!(m.fetcher().requests().len(), 2);
        assert!(!m.is_ready(&a));

        let audio_ticket = m.fetcher().requests()[0].ticket;
        assert!(m.complete(audio_ticket, Ok(())));
        assert!(!m.is_ready(&a));

        drain(&mut m, Instant::now());
        assert!(m.is_ready(&a));
    }

    #[test]
    fn warming_the_same_window_twice_is_idempotent() {
        let mut m = manager();
        let a = track("a", false);
        let b = track("b", true);
        m.warm(&[&a, &b]);
        m.warm(&[&a, &b]);
        assert_eq!(m.fetcher().requests().len(), 3);
    }

    #[test]
    fn tracks_outside_the_window_are_evicted() {
        let mut m = manager();
        let a = track("a", false);
        let b = track("b", false);
        m.warm(&[&a]);
        let stale = m.fetcher().requests()[0].ticket;

        m.warm(&[&b]);
        assert!(m.state("a", PipelineKind::Audio).is_none());
        assert!(!m.complete(stale, Ok(())));
        assert_eq!(m.state("b", PipelineKind::Audio), Some(&PreloadState::Pending));
    }

    #[test]
    fn failures_are_recorded_softly() {
        let mut m = manager();
        m.fetcher_mut().fail_sources_containing("b.mp3");
        let b = track("b", false);
        m.warm(&[&b]);
        drain(&mut m, Instant::now());
        assert!(matches!(
            m.state("b", PipelineKind::Audio),
            Some(PreloadState::Failed(_))
        ));
        assert!(!m.is_ready(&b));
    }

    #[test]
    fn disabled_manager_never_fetches() {
        let settings = PreloadSettings {
            enabled: false,
            ..PreloadSettings::default()
        };
        let mut m = PreloadManager::new(SimulatedFetcher::new(Duration::ZERO), &settings);
        m.warm(&[&track("a", true)]);
        assert!(m.fetcher().requests().is_empty());
    }
}
