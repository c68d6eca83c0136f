use std::path::PathBuf;

use serde::Deserialize;

/// Top-level player settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/duet/config.toml` or `~/.config/duet/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `DUET__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sync: SyncSettings,
    pub sequencing: SequencingSettings,
    pub loading: LoadingSettings,
    pub preload: PreloadSettings,
    pub notices: NoticeSettings,
    pub feed: FeedSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Maximum drift between the pipelines before the shadow is corrected (seconds).
    pub drift_tolerance_secs: f64,
    /// Cadence of the drift check while playing (milliseconds).
    pub correction_interval_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            drift_tolerance_secs: 0.3,
            correction_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SequencingSettings {
    /// `previous` restarts the current track instead of navigating past this point (seconds).
    pub restart_grace_secs: f64,
    /// Remaining time below which the end poll treats the track as finished (seconds).
    pub end_epsilon_secs: f64,
    /// A scrub landing this close to the end finishes the track (seconds).
    pub scrub_end_epsilon_secs: f64,
    /// Cadence of the end-of-track poll while playing (milliseconds).
    pub end_poll_interval_ms: u64,
}

impl Default for SequencingSettings {
    fn default() -> Self {
        Self {
            restart_grace_secs: 3.0,
            end_epsilon_secs: 0.5,
            scrub_end_epsilon_secs: 0.5,
            end_poll_interval_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoadingSettings {
    /// Retries per pipeline before a load error is surfaced.
    pub max_retries: u32,
    /// Base delay of the exponential retry backoff (milliseconds).
    pub retry_backoff_ms: u64,
    /// Start playback anyway if readiness has not been reported by then (milliseconds).
    pub resume_fallback_ms: u64,
    /// Scrubber length shown until real metadata arrives (seconds).
    pub provisional_duration_secs: f64,
    /// A seek that has not settled by then is reported (milliseconds).
    pub seek_timeout_ms: u64,
}

impl Default for LoadingSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff_ms: 500,
            resume_fallback_ms: 1500,
            provisional_duration_secs: 180.0,
            seek_timeout_ms: 4000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreloadSettings {
    pub enabled: bool,
    /// How many tracks after the current one are warmed.
    pub lookahead: usize,
}

impl Default for PreloadSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            lookahead: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NoticeSettings {
    /// Auto-dismiss delay for informational and warning notices (milliseconds).
    pub info_dismiss_ms: u64,
    /// Auto-dismiss delay for error notices (milliseconds).
    pub error_dismiss_ms: u64,
}

impl Default for NoticeSettings {
    fn default() -> Self {
        Self {
            info_dismiss_ms: 3000,
            error_dismiss_ms: 6000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Playlist feed used when none is given on the command line.
    pub path: Option<PathBuf>,
    /// Title of the built-in track used when the feed is missing or malformed.
    pub default_title: String,
    /// Audio source of the built-in track.
    pub default_audio_uri: String,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            path: None,
            default_title: "Introduction".to_string(),
            default_audio_uri: "media/intro.mp3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    pub filter: String,
    /// Write daily-rotated log files here instead of stderr.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "duet=info,warn".to_string(),
            directory: None,
        }
    }
}
