use super::load::{default_config_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_duet_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("DUET_CONFIG_PATH", "/tmp/duet-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/duet-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("duet")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("duet")
            .join("config.toml")
    );
}

#[test]
fn defaults_match_documented_thresholds() {
    let s = Settings::default();
    assert_eq!(s.sync.drift_tolerance_secs, 0.3);
    assert_eq!(s.sync.correction_interval_ms, 1000);
    assert_eq!(s.sequencing.restart_grace_secs, 3.0);
    assert_eq!(s.loading.resume_fallback_ms, 1500);
    assert!(s.validate().is_ok());
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[sync]
drift_tolerance_secs = 0.25
correction_interval_ms = 500

[sequencing]
restart_grace_secs = 5.0
end_epsilon_secs = 0.2
end_poll_interval_ms = 100

[loading]
max_retries = 1
resume_fallback_ms = 900

[preload]
enabled = false
lookahead = 2

[feed]
path = "/srv/feed.json"
default_title = "Welcome"

[logging]
filter = "duet=trace"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("DUET_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("DUET__SYNC__DRIFT_TOLERANCE_SECS");

    let s = Settings::load().unwrap();
    assert_eq!(s.sync.drift_tolerance_secs, 0.25);
    assert_eq!(s.sync.correction_interval_ms, 500);
    assert_eq!(s.sequencing.restart_grace_secs, 5.0);
    assert_eq!(s.sequencing.end_epsilon_secs, 0.2);
    assert_eq!(s.sequencing.end_poll_interval_ms, 100);
    // Untouched keys keep their defaults.
    assert_eq!(s.sequencing.scrub_end_epsilon_secs, 0.5);
    assert_eq!(s.loading.max_retries, 1);
    assert_eq!(s.loading.resume_fallback_ms, 900);
    assert!(!s.preload.enabled);
    assert_eq!(s.preload.lookahead, 2);
    assert_eq!(
        s.feed.path.as_deref(),
        Some(std::path::Path::new("/srv/feed.json"))
    );
    assert_eq!(s.feed.default_title, "Welcome");
    assert_eq!(s.logging.filter, "duet=trace");
    assert!(s.logging.directory.is_none());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[loading]
max_retries = 5
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("DUET_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("DUET__LOADING__MAX_RETRIES", "0");

    let s = Settings::load().unwrap();
    assert_eq!(s.loading.max_retries, 0);
}

#[test]
fn relative_paths_resolve_against_the_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[feed]
path = "feeds/tour.json"

[logging]
directory = "/var/log/duet"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("DUET_CONFIG_PATH", cfg_path.to_str().unwrap());

    let s = Settings::load().unwrap();
    assert_eq!(s.feed.path, Some(dir.path().join("feeds/tour.json")));
    assert_eq!(
        s.logging.directory.as_deref(),
        Some(std::path::Path::new("/var/log/duet"))
    );
}

#[test]
fn validate_rejects_zero_intervals_and_tolerance() {
    let mut s = Settings::default();
    s.sync.correction_interval_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.sync.drift_tolerance_secs = 0.0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.sequencing.end_poll_interval_ms = 0;
    assert!(s.validate().is_err());
}
