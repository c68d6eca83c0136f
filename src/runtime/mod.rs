use std::env;
use std::path::PathBuf;
use std::sync::mpsc;

use crate::library::load_or_default;
use crate::player::PlayerEvent;

mod commands;
mod event_loop;
mod settings;
mod startup;

pub use commands::{Input, parse_command};

/// Headless host: commands on stdin, player events as JSON lines on stdout.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, warning) = settings::load_settings();
    let _log_guard = crate::logging::init_logging(&settings.logging)?;
    if let Some(msg) = warning {
        tracing::warn!("{msg}");
    }

    let feed = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| settings.feed.path.clone());
    let playlist = load_or_default(feed.as_deref(), &settings.feed);
    tracing::info!(
        groups = playlist.groups().len(),
        tracks = playlist.track_count(),
        "playlist ready"
    );

    let (event_tx, event_rx) = mpsc::channel::<PlayerEvent>();
    let mut player = startup::build_player(&settings, playlist, event_tx);

    let input_rx = commands::spawn_stdin_reader();

    event_loop::run(&mut player, &input_rx, &event_rx)
}
