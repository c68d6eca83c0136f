//! Position within a sub-playlist and the single end-of-track gate.
//!
//! Navigation never crosses sub-playlist boundaries. End of track is detected
//! three ways (native end event, near-end poll, scrub to the end); all of
//! them go through [`PlaylistSequencer::claim_advance`], which lets only the
//! first one through until the next load clears the flag.

use crate::config::SequencingSettings;
use crate::error::SequencingError;
use crate::library::{Cursor, Playlist};

use super::session::PlaybackSession;

/// Which detector noticed the end of the track.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EndSignal {
    NativeEnded,
    NearEndPoll,
    ScrubToEnd,
}

/// What `previous` should do.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Previous {
    /// Seek the current track back to 0.
    Restart,
    MoveTo(Cursor),
}

/// True when less than `epsilon` seconds remain.
pub fn is_near_end(current: f64, duration: Option<f64>, epsilon: f64) -> bool {
    match duration {
        Some(d) if d.is_finite() && d > 0.0 => d - current < epsilon,
        _ => false,
    }
}

pub struct PlaylistSequencer {
    position: Option<Cursor>,
    grace: f64,
}

impl PlaylistSequencer {
    pub fn new(settings: &SequencingSettings) -> Self {
        Self {
            position: None,
            grace: settings.restart_grace_secs,
        }
    }

    /// `None` until the first track is loaded.
    pub fn position(&self) -> Option<Cursor> {
        self.position
    }

    pub fn set_position(&mut self, cursor: Cursor) {
        self.position = Some(cursor);
    }

    fn current(&self, playlist: &Playlist) -> Result<Cursor, SequencingError> {
        if playlist.is_empty() {
            return Err(SequencingError::EmptyPlaylist);
        }
        self.position
            .filter(|c| playlist.track(*c).is_some())
            .ok_or(SequencingError::EmptyPlaylist)
    }

    /// The track after the current one in the same sub-playlist.
    pub fn next_cursor(&self, playlist: &Playlist) -> Result<Cursor, SequencingError> {
        let cur = self.current(playlist)?;
        if cur.index + 1 >= playlist.group_len(cur) {
            return Err(SequencingError::EndOfPlaylist);
        }
        Ok(Cursor {
            group: cur.group,
            index: cur.index + 1,
        })
    }

    /// Decide what "previous" means at `active_time` into the current track.
    ///
    /// Past the grace period it restarts the track. At the first index it
    /// reports `StartOfPlaylist`; the caller still restarts the track.
    pub fn previous_target(
        &self,
        playlist: &Playlist,
        active_time: f64,
    ) -> Result<Previous, SequencingError> {
        let cur = self.current(playlist)?;
        if active_time > self.grace {
            return Ok(Previous::Restart);
        }
        if cur.index == 0 {
            return Err(SequencingError::StartOfPlaylist);
        }
        Ok(Previous::MoveTo(Cursor {
            group: cur.group,
            index: cur.index - 1,
        }))
    }

    pub fn select(&self, playlist: &Playlist, track_id: &str) -> Result<Cursor, SequencingError> {
        if playlist.is_empty() {
            return Err(SequencingError::EmptyPlaylist);
        }
        playlist
            .find(track_id)
            .ok_or_else(|| SequencingError::UnknownTrack(track_id.to_string()))
    }

    /// The advance gate. Only the first end signal per load gets `true`.
    pub fn claim_advance(session: &mut PlaybackSession, signal: EndSignal) -> bool {
        if session.advance_triggered {
            tracing::trace!(?signal, "advance already triggered for this track");
            return false;
        }
        session.advance_triggered = true;
        tracing::debug!(?signal, "end of track");
        true
    }
}
