use std::{
    env,
    path::{Path, PathBuf},
};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `DUET__`), then an
/// optional config file and falls back to struct defaults. Relative feed and
/// log paths are taken relative to the config file's directory.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("DUET")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let mut settings: Settings = cfg.try_deserialize()?;
        if let Some(base) = config_path
            .as_deref()
            .filter(|p| p.is_file())
            .and_then(Path::parent)
        {
            settings.anchor_paths(base);
        }
        Ok(settings)
    }

    fn anchor_paths(&mut self, base: &Path) {
        for path in [&mut self.feed.path, &mut self.logging.directory]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.sync.drift_tolerance_secs > 0.0) {
            return Err("sync.drift_tolerance_secs must be > 0".to_string());
        }
        if self.sync.correction_interval_ms == 0 {
            return Err("sync.correction_interval_ms must be >= 1".to_string());
        }
        if self.sequencing.end_poll_interval_ms == 0 {
            return Err("sequencing.end_poll_interval_ms must be >= 1".to_string());
        }
        if self.sequencing.end_epsilon_secs < 0.0 || self.sequencing.scrub_end_epsilon_secs < 0.0 {
            return Err("sequencing epsilons must be >= 0".to_string());
        }
        if self.sequencing.restart_grace_secs < 0.0 {
            return Err("sequencing.restart_grace_secs must be >= 0".to_string());
        }
        if !(self.loading.provisional_duration_secs > 0.0) {
            return Err("loading.provisional_duration_secs must be > 0".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `DUET_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("DUET_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/duet/config.toml`
/// or `~/.config/duet/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("duet").join("config.toml"))
}
