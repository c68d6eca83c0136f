use crate::config::FeedSettings;
use crate::media::PipelineKind;

/// One logical track: an audio source, an immersive video source, or both.
///
/// Tracks are immutable once loaded into a pipeline; navigation replaces the
/// whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub chapter: Option<u32>,
    pub audio_uri: Option<String>,
    pub video_uri: Option<String>,
    pub artwork_uri: Option<String>,
    pub playlist_name: String,
    /// Duration advertised by the feed, used for the provisional scrubber.
    pub duration_hint: Option<f64>,
}

impl Track {
    pub fn has_audio(&self) -> bool {
        self.audio_uri.is_some()
    }

    pub fn has_video(&self) -> bool {
        self.video_uri.is_some()
    }

    /// Video content but no audio source: audio-only mode is unreachable.
    pub fn is_immersive_only(&self) -> bool {
        self.has_video() && !self.has_audio()
    }

    /// The source URI for the given pipeline, if the track has one.
    pub fn source(&self, kind: PipelineKind) -> Option<&str> {
        match kind {
            PipelineKind::Audio => self.audio_uri.as_deref(),
            PipelineKind::Video => self.video_uri.as_deref(),
        }
    }
}

/// A named, ordered sub-playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistGroup {
    pub name: String,
    pub tracks: Vec<Track>,
}

/// Position of a track: sub-playlist index plus index within it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Cursor {
    pub group: usize,
    pub index: usize,
}

/// All tracks of a feed, partitioned into ordered sub-playlists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playlist {
    groups: Vec<PlaylistGroup>,
}

impl Playlist {
    /// Build a playlist from groups, dropping empty ones.
    pub fn new(groups: Vec<PlaylistGroup>) -> Self {
        Self {
            groups: groups.into_iter().filter(|g| !g.tracks.is_empty()).collect(),
        }
    }

    /// Partition `tracks` by `playlist_name`, keeping first-seen group order
    /// and the relative order of tracks within each group.
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        let mut groups: Vec<PlaylistGroup> = Vec::new();
        for track in tracks {
            match groups.iter_mut().find(|g| g.name == track.playlist_name) {
                Some(group) => group.tracks.push(track),
                None => groups.push(PlaylistGroup {
                    name: track.playlist_name.clone(),
                    tracks: vec![track],
                }),
            }
        }
        Self::new(groups)
    }

    /// The single built-in track used when the feed is missing or malformed.
    pub fn fallback(settings: &FeedSettings) -> Self {
        Self::from_tracks(vec![Track {
            id: "default".to_string(),
            title: settings.default_title.clone(),
            chapter: None,
            audio_uri: Some(settings.default_audio_uri.clone()),
            video_uri: None,
            artwork_uri: None,
            playlist_name: "default".to_string(),
            duration_hint: None,
        }])
    }

    pub fn groups(&self) -> &[PlaylistGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn track_count(&self) -> usize {
        self.groups.iter().map(|g| g.tracks.len()).sum()
    }

    /// First track of the first sub-playlist.
    pub fn first(&self) -> Option<Cursor> {
        (!self.groups.is_empty()).then_some(Cursor { group: 0, index: 0 })
    }

    pub fn track(&self, cursor: Cursor) -> Option<&Track> {
        self.groups.get(cursor.group)?.tracks.get(cursor.index)
    }

    /// Number of tracks in the cursor's sub-playlist.
    pub fn group_len(&self, cursor: Cursor) -> usize {
        self.groups.get(cursor.group).map(|g| g.tracks.len()).unwrap_or(0)
    }

    pub fn find(&self, track_id: &str) -> Option<Cursor> {
        self.groups.iter().enumerate().find_map(|(group, g)| {
            g.tracks
                .iter()
                .position(|t| t.id == track_id)
                .map(|index| Cursor { group, index })
        })
    }

    /// Up to `count` tracks after `cursor` within the same sub-playlist.
    pub fn following(&self, cursor: Cursor, count: usize) -> Vec<&Track> {
        self.groups
            .get(cursor.group)
            .map(|g| g.tracks.iter().skip(cursor.index + 1).take(count).collect())
            .unwrap_or_default()
    }
}
