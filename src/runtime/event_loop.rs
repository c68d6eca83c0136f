use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::media::{MediaPipeline, PipelineKind};
use crate::player::PlayerEvent;

use super::commands::Input;
use super::startup::HostPlayer;

/// Upper bound on one wait, so the simulated pipelines keep advancing.
const HOST_TICK: Duration = Duration::from_millis(100);
/// Rounds of event feedback handled per tick before yielding.
const MAX_PUMP_ROUNDS: usize = 16;

/// Main loop: wait for input or the next timer, advance the host clock, feed
/// pipeline events back into the player and print what it reports. Returns
/// when `quit` is read or stdin closes.
pub fn run(
    player: &mut HostPlayer,
    input: &Receiver<Input>,
    events: &Receiver<PlayerEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let now = Instant::now();
        let wait = player
            .next_deadline()
            .map(|d| d.saturating_duration_since(now))
            .unwrap_or(HOST_TICK)
            .min(HOST_TICK);

        match input.recv_timeout(wait) {
            Ok(Input::Quit) | Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("shutting down");
                break;
            }
            Ok(Input::Player(cmd)) => player.dispatch(cmd, Instant::now()),
            Err(RecvTimeoutError::Timeout) => {}
        }

        let now = Instant::now();
        step_host(player, now);
        pump_media(player, now);
        player.poll_timers(now);
        pump_media(player, now);

        for event in events.try_iter() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }

    Ok(())
}

fn step_host(player: &mut HostPlayer, now: Instant) {
    for kind in PipelineKind::ALL {
        player.pipeline_mut(kind).step(now);
    }
    let done = player.preload_mut().fetcher_mut().step(now);
    for (ticket, outcome) in done {
        player.handle_preload(ticket, outcome);
    }
}

fn pump_media(player: &mut HostPlayer, now: Instant) {
    for _ in 0..MAX_PUMP_ROUNDS {
        let mut idle = true;
        for kind in PipelineKind::ALL {
            for (generation, event) in player.pipeline_mut(kind).take_events() {
                idle = false;
                player.handle_media(kind, generation, event, now);
            }
        }
        if idle {
            return;
        }
    }
    tracing::debug!(
        audio_paused = player.pipeline(PipelineKind::Audio).is_paused(),
        video_paused = player.pipeline(PipelineKind::Video).is_paused(),
        "media events still queued after pump limit"
    );
}
