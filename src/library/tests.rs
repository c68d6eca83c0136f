use super::*;
use crate::config::FeedSettings;
use crate::error::FeedError;
use crate::media::PipelineKind;
use std::path::Path;

#[test]
fn grouped_json_feed_accepts_field_aliases() {
    let feed = r#"{
        "playlists": [
            {
                "name": "A",
                "tracks": [
                    { "chapter": 1, "title": "Arrival", "audioUrl": "a1.mp3", "video360": "a1.mp4", "cover": "a1.jpg" },
                    { "number": "2", "name": "Harbour", "audio_src": "a2.mp3" },
                    { "id": "a3", "videoUrl": "a3.mp4", "immersive": true, "duration": 95 }
                ]
            },
            { "title": "B", "chapters": [ { "src": "b1.mp3" } ] }
        ]
    }"#;

    let playlist = parse_feed(feed, FeedFormat::Json).unwrap();
    assert_eq!(playlist.groups().len(), 2);
    assert_eq!(playlist.groups()[0].name, "A");
    assert_eq!(playlist.groups()[1].name, "B");

    let a = &playlist.groups()[0].tracks;
    assert_eq!(a[0].id, "1");
    assert_eq!(a[0].chapter, Some(1));
    assert_eq!(a[0].audio_uri.as_deref(), Some("a1.mp3"));
    assert_eq!(a[0].video_uri.as_deref(), Some("a1.mp4"));
    assert_eq!(a[0].artwork_uri.as_deref(), Some("a1.jpg"));
    assert!(!a[0].is_immersive_only());

    assert_eq!(a[1].id, "2");
    assert_eq!(a[1].title, "Harbour");
    assert_eq!(a[1].source(PipelineKind::Video), None);

    assert_eq!(a[2].id, "a3");
    assert!(a[2].is_immersive_only());
    assert_eq!(a[2].duration_hint, Some(95.0));
    assert_eq!(a[2].title, "Track 3");

    let b = &playlist.groups()[1].tracks[0];
    assert_eq!(b.id, "B-1");
    assert_eq!(b.playlist_name, "B");
}

#[test]
fn explicit_non_immersive_flag_drops_video() {
    let feed = r#"[ { "name": "A", "tracks": [
        { "id": 7, "audio": "x.mp3", "video": "x.mp4", "is360": false }
    ] } ]"#;

    let playlist = parse_feed(feed, FeedFormat::Json).unwrap();
    let track = &playlist.groups()[0].tracks[0];
    assert!(track.has_audio());
    assert!(!track.has_video());
}

#[test]
fn flat_feed_is_partitioned_by_playlist_name_in_first_seen_order() {
    let feed = r#"[
        { "id": "b1", "audio": "b1.mp3", "playlist": "B" },
        { "id": "a1", "audio": "a1.mp3", "playlistName": "A" },
        { "id": "b2", "audio": "b2.mp3", "group": "B" },
        { "id": "x",  "title": "no sources" },
        42
    ]"#;

    let playlist = parse_feed(feed, FeedFormat::Json).unwrap();
    let names: Vec<&str> = playlist.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["B", "A"]);
    let ids: Vec<&str> = playlist.groups()[0]
        .tracks
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(ids, vec!["b1", "b2"]);
    assert_eq!(playlist.track_count(), 3);
}

#[test]
fn toml_feed_is_supported() {
    let feed = r#"
[[playlists]]
name = "Tour"

[[playlists.tracks]]
chapter = 1
title = "Gate"
audio_url = "gate.mp3"

[[playlists.tracks]]
chapter = 2
video_url = "tower.mp4"
"#;

    let playlist = parse_feed(feed, FeedFormat::Toml).unwrap();
    let tracks = &playlist.groups()[0].tracks;
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[1].title, "Chapter 2");
    assert!(tracks[1].is_immersive_only());
}

#[test]
fn empty_or_malformed_feeds_are_errors() {
    assert!(matches!(
        parse_feed(r#"{ "playlists": [] }"#, FeedFormat::Json),
        Err(FeedError::Empty)
    ));
    assert!(matches!(
        parse_feed(r#"[ { "title": "silent" } ]"#, FeedFormat::Json),
        Err(FeedError::Empty)
    ));
    assert!(matches!(
        parse_feed("{ not json", FeedFormat::Json),
        Err(FeedError::Json(_))
    ));
}

#[test]
fn load_or_default_falls_back_to_built_in_track() {
    let settings = FeedSettings::default();

    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("feed.json");
    std::fs::write(&bad, "[]").unwrap();

    for path in [None, Some(bad.as_path()), Some(Path::new("/nonexistent/feed.json"))] {
        let playlist = load_or_default(path, &settings);
        assert_eq!(playlist.track_count(), 1);
        let track = playlist.track(playlist.first().unwrap()).unwrap();
        assert_eq!(track.title, settings.default_title);
        assert_eq!(track.audio_uri.as_deref(), Some(settings.default_audio_uri.as_str()));
    }
}

#[test]
fn load_feed_picks_format_from_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feed.TOML");
    std::fs::write(
        &path,
        "[[playlists]]\nname = \"A\"\n[[playlists.tracks]]\naudio = \"a.mp3\"\n",
    )
    .unwrap();

    assert_eq!(FeedFormat::from_path(&path), FeedFormat::Toml);
    let playlist = load_feed(&path).unwrap();
    assert_eq!(playlist.track_count(), 1);
}

#[test]
fn playlist_navigation_helpers() {
    let feed = r#"[ { "name": "A", "tracks": [
        { "id": "1", "audio": "1.mp3" },
        { "id": "2", "audio": "2.mp3" },
        { "id": "3", "audio": "3.mp3" }
    ] }, { "name": "B", "tracks": [ { "id": "b", "audio": "b.mp3" } ] } ]"#;
    let playlist = parse_feed(feed, FeedFormat::Json).unwrap();

    let c = playlist.find("2").unwrap();
    assert_eq!(c, Cursor { group: 0, index: 1 });
    assert_eq!(playlist.group_len(c), 3);
    let ids: Vec<&str> = playlist.following(c, 5).iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["3"]);
    assert_eq!(playlist.find("b"), Some(Cursor { group: 1, index: 0 }));
    assert!(playlist.find("missing").is_none());
}
