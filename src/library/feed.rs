//! Playlist feed ingestion.
//!
//! Feeds in the wild use several naming conventions for the same fields
//! (`audioUrl`, `audio_src`, `video360`, ...). They are normalized here, once,
//! into canonical [`Track`]s so nothing downstream branches on naming variants.

use std::path::Path;

use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::config::FeedSettings;
use crate::error::FeedError;

use super::model::{Playlist, PlaylistGroup, Track};

const DEFAULT_GROUP: &str = "main";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FeedFormat {
    Json,
    Toml,
}

impl FeedFormat {
    /// Pick the format from a file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFeed {
    Grouped { playlists: Vec<RawGroup> },
    Groups(Vec<RawGroup>),
    Flat(Vec<LenientTrack>),
}

#[derive(Deserialize)]
struct RawGroup {
    #[serde(default, alias = "title", alias = "playlist")]
    name: Option<String>,
    #[serde(alias = "chapters", alias = "items")]
    tracks: Vec<LenientTrack>,
}

/// A track record that failed to parse is skipped instead of failing the feed.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientTrack {
    Valid(RawTrack),
    Invalid(IgnoredAny),
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawTrack {
    #[serde(alias = "trackId", alias = "track_id")]
    id: Option<RawId>,
    #[serde(alias = "number", alias = "chapterNumber", alias = "chapter_number")]
    chapter: Option<RawId>,
    #[serde(alias = "name")]
    title: Option<String>,
    #[serde(
        alias = "audioUrl",
        alias = "audio_url",
        alias = "audioSrc",
        alias = "audio_src",
        alias = "src"
    )]
    audio: Option<String>,
    #[serde(
        alias = "videoUrl",
        alias = "video_url",
        alias = "video360",
        alias = "immersiveUrl",
        alias = "immersive_url"
    )]
    video: Option<String>,
    #[serde(
        alias = "artworkUrl",
        alias = "artwork_url",
        alias = "cover",
        alias = "image"
    )]
    artwork: Option<String>,
    #[serde(alias = "is360", alias = "has360", alias = "has_360")]
    immersive: Option<bool>,
    #[serde(alias = "playlistName", alias = "playlist_name", alias = "group")]
    playlist: Option<String>,
    #[serde(alias = "length")]
    duration: Option<f64>,
}

#[derive(Deserialize, Clone)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    fn as_text(&self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s.trim().to_string(),
        }
    }

    fn as_number(&self) -> Option<u32> {
        match self {
            RawId::Number(n) => u32::try_from(*n).ok(),
            RawId::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalize one record. Returns `None` for records with no playable source.
fn normalize_track(raw: RawTrack, group: &str, position: usize) -> Option<Track> {
    let audio_uri = non_empty(raw.audio);
    // An explicit "not immersive" flag wins over a stray video URL.
    let video_uri = match raw.immersive {
        Some(false) => None,
        _ => non_empty(raw.video),
    };

    if audio_uri.is_none() && video_uri.is_none() {
        return None;
    }

    let chapter = raw.chapter.as_ref().and_then(RawId::as_number);
    let id = raw
        .id
        .as_ref()
        .or(raw.chapter.as_ref())
        .map(RawId::as_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("{group}-{}", position + 1));
    let title = non_empty(raw.title).unwrap_or_else(|| match chapter {
        Some(n) => format!("Chapter {n}"),
        None => format!("Track {}", position + 1),
    });

    Some(Track {
        id,
        title,
        chapter,
        audio_uri,
        video_uri,
        artwork_uri: non_empty(raw.artwork),
        playlist_name: group.to_string(),
        duration_hint: raw.duration.filter(|d| d.is_finite() && *d > 0.0),
    })
}

fn normalize_group(name: &str, records: Vec<LenientTrack>) -> PlaylistGroup {
    let mut tracks = Vec::with_capacity(records.len());
    for (position, record) in records.into_iter().enumerate() {
        match record {
            LenientTrack::Valid(raw) => match normalize_track(raw, name, position) {
                Some(track) => tracks.push(track),
                None => tracing::warn!(group = name, position, "skipping track without sources"),
            },
            LenientTrack::Invalid(_) => {
                tracing::warn!(group = name, position, "skipping unrecognized track record")
            }
        }
    }
    PlaylistGroup {
        name: name.to_string(),
        tracks,
    }
}

fn normalize(raw: RawFeed) -> Playlist {
    match raw {
        RawFeed::Grouped { playlists } | RawFeed::Groups(playlists) => Playlist::new(
            playlists
                .into_iter()
                .enumerate()
                .map(|(i, g)| {
                    let name = non_empty(g.name).unwrap_or_else(|| {
                        if i == 0 {
                            DEFAULT_GROUP.to_string()
                        } else {
                            format!("{DEFAULT_GROUP}-{}", i + 1)
                        }
                    });
                    normalize_group(&name, g.tracks)
                })
                .collect(),
        ),
        RawFeed::Flat(records) => {
            // Flat feeds carry the group per record; positions are per group.
            let mut tracks = Vec::new();
            let mut seen: Vec<(String, usize)> = Vec::new();
            for record in records {
                let LenientTrack::Valid(raw) = record else {
                    tracing::warn!("skipping unrecognized track record");
                    continue;
                };
                let group = non_empty(raw.playlist.clone())
                    .unwrap_or_else(|| DEFAULT_GROUP.to_string());
                let position = match seen.iter_mut().find(|(g, _)| *g == group) {
                    Some((_, n)) => {
                        *n += 1;
                        *n - 1
                    }
                    None => {
                        seen.push((group.clone(), 1));
                        0
                    }
                };
                match normalize_track(raw, &group, position) {
                    Some(track) => tracks.push(track),
                    None => tracing::warn!(group = %group, position, "skipping track without sources"),
                }
            }
            Playlist::from_tracks(tracks)
        }
    }
}

/// Parse feed text into a playlist.
pub fn parse_feed(text: &str, format: FeedFormat) -> Result<Playlist, FeedError> {
    let raw: RawFeed = match format {
        FeedFormat::Json => serde_json::from_str(text)?,
        FeedFormat::Toml => toml::from_str(text)?,
    };

    let playlist = normalize(raw);
    if playlist.is_empty() {
        return Err(FeedError::Empty);
    }
    Ok(playlist)
}

/// Read and parse a feed file, choosing the format by extension.
pub fn load_feed(path: &Path) -> Result<Playlist, FeedError> {
    let text = std::fs::read_to_string(path).map_err(|source| FeedError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_feed(&text, FeedFormat::from_path(path))
}

/// Load the feed at `path`, falling back to the built-in default track when
/// the feed is missing, malformed or empty.
pub fn load_or_default(path: Option<&Path>, settings: &FeedSettings) -> Playlist {
    let Some(path) = path else {
        tracing::info!("no playlist feed configured, using default track");
        return Playlist::fallback(settings);
    };

    match load_feed(path) {
        Ok(playlist) => {
            tracing::info!(
                path = %path.display(),
                groups = playlist.groups().len(),
                tracks = playlist.track_count(),
                "playlist feed loaded"
            );
            playlist
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unusable playlist feed, using default track");
            Playlist::fallback(settings)
        }
    }
}
