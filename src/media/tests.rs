use super::*;
use std::time::{Duration, Instant};

fn events(p: &mut SimulatedPipeline) -> Vec<MediaEvent> {
    p.take_events().into_iter().map(|(_, e)| e).collect()
}

#[test]
fn load_becomes_ready_after_latency_and_tags_generation() {
    let t0 = Instant::now();
    let mut p = SimulatedPipeline::new(PipelineKind::Audio)
        .with_media_duration(12.0)
        .with_load_latency(Duration::from_millis(200));

    p.load("a.mp3", 4);
    p.step(t0);
    p.step(t0 + Duration::from_millis(100));
    assert_eq!(p.ready_state(), ReadyState::HaveNothing);
    assert!(p.take_events().is_empty());

    p.step(t0 + Duration::from_millis(250));
    assert!(p.ready_state().can_play());
    assert_eq!(p.duration(), Some(12.0));
    let evs = p.take_events();
    assert_eq!(
        evs,
        vec![
            (4, MediaEvent::LoadedMetadata { duration: 12.0 }),
            (4, MediaEvent::CanPlay)
        ]
    );
}

#[test]
fn playback_reaches_end_then_pauses_and_reports_ended() {
    let t0 = Instant::now();
    let mut p = SimulatedPipeline::new(PipelineKind::Video);
    p.load("v.mp4", 1);
    p.complete_load(1.0);
    p.play().unwrap();
    p.step(t0);
    p.take_events();

    p.step(t0 + Duration::from_millis(1500));
    assert!(p.is_paused());
    assert_eq!(p.current_time(), 1.0);
    let evs = events(&mut p);
    assert!(evs.ends_with(&[MediaEvent::Paused, MediaEvent::Ended]));
}

#[test]
fn failing_source_reports_error_once() {
    let t0 = Instant::now();
    let mut p = SimulatedPipeline::new(PipelineKind::Audio).with_load_latency(Duration::ZERO);
    p.fail_sources_containing("broken");
    p.load("broken.mp3", 2);
    p.step(t0);
    p.step(t0 + Duration::from_millis(10));

    let evs = events(&mut p);
    assert_eq!(evs.len(), 1);
    assert!(matches!(evs[0], MediaEvent::Error { .. }));
}

#[test]
fn state_changes_only_emit_events_when_something_changed() {
    let mut p = SimulatedPipeline::new(PipelineKind::Audio);
    p.set_muted(false);
    p.pause();
    assert!(p.take_events().is_empty());

    p.load("a.mp3", 1);
    p.set_muted(true);
    p.set_muted(true);
    assert_eq!(events(&mut p), vec![MediaEvent::VolumeChange]);
}

#[test]
fn play_without_source_or_when_blocked_is_rejected() {
    let mut p = SimulatedPipeline::new(PipelineKind::Video);
    assert!(p.play().is_err());

    p.load("v.mp4", 1);
    p.reject_play(Some("autoplay blocked"));
    let err = p.play().unwrap_err();
    assert_eq!(err.reason, "autoplay blocked");
    assert!(p.is_paused());
}

#[test]
fn seeks_clamp_to_known_duration() {
    let mut p = SimulatedPipeline::new(PipelineKind::Audio);
    p.load("a.mp3", 1);
    p.complete_load(10.0);
    p.set_current_time(25.0);
    assert_eq!(p.current_time(), 10.0);
    p.set_current_time(-3.0);
    assert_eq!(p.current_time(), 0.0);
}

#[test]
fn fetcher_completes_after_latency() {
    let t0 = Instant::now();
    let mut f = SimulatedFetcher::new(Duration::from_millis(100));
    f.fail_sources_containing("bad");
    f.prefetch(PrefetchRequest {
        ticket: 1,
        track_id: "1".into(),
        pipeline: PipelineKind::Audio,
        uri: "good.mp3".into(),
    });
    f.prefetch(PrefetchRequest {
        ticket: 2,
        track_id: "1".into(),
        pipeline: PipelineKind::Video,
        uri: "bad.mp4".into(),
    });

    assert!(f.step(t0).is_empty());
    let done = f.step(t0 + Duration::from_millis(150));
    assert_eq!(done.len(), 2);
    assert_eq!(done[0], (1, Ok(())));
    assert!(done[1].1.is_err());
    assert_eq!(f.requests().len(), 2);
}
