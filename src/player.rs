//! Player core: the dual-pipeline state machine.
//!
//! `model` holds the `Player` that wires the components together; each
//! component lives in its own submodule and only touches the pipelines
//! through a `Deck`.

mod events;
mod loader;
mod mode;
mod model;
mod mute;
mod preload;
mod scheduler;
mod sequencer;
mod session;
mod sync;

pub use events::{Command, Notice, NoticeLevel, Notifier, PlayerEvent, SceneCommand};
pub use loader::{TrackLoader, cache_busted};
pub use mode::{ModeSwitch, PlaybackModeController};
pub use model::Player;
pub use mute::MuteArbiter;
pub use preload::{PreloadManager, PreloadState};
pub use scheduler::{ScheduledTask, Scheduler, TaskKind};
pub use sequencer::{EndSignal, PlaylistSequencer, Previous, is_near_end};
pub use session::{Deck, PlaybackMode, PlaybackSession};
pub use sync::{DriftCheck, DualTrackSynchronizer};
