use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::library::Playlist;
use crate::media::{PipelineKind, SimulatedFetcher, SimulatedPipeline};
use crate::player::{Player, PlayerEvent};

pub type HostPlayer = Player<SimulatedPipeline, SimulatedFetcher>;

const PREFETCH_LATENCY: Duration = Duration::from_millis(200);

/// Build the player on simulated pipelines and load the first track, paused.
pub fn build_player(settings: &Settings, playlist: Playlist, events: Sender<PlayerEvent>) -> HostPlayer {
    let mut player = Player::new(
        SimulatedPipeline::new(PipelineKind::Audio),
        SimulatedPipeline::new(PipelineKind::Video),
        SimulatedFetcher::new(PREFETCH_LATENCY),
        playlist,
        settings,
        events,
    );

    let now = Instant::now();
    if let Err(e) = player.start(now) {
        tracing::warn!(error = %e, "nothing to load at startup");
    }
    for kind in PipelineKind::ALL {
        player.pipeline_mut(kind).step(now);
    }
    player
}
