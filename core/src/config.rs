//! Configuration management (config.toml)
//!
//! Handles loading, saving, and providing defaults for recorder, player and
//! storage settings. Settings are stored in TOML format in the
//! platform-specific config directory.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::replay::{PlayerConfig, RecorderConfig};

const CONFIG_FILE: &str = "config.toml";

/// Application configuration.
///
/// Contains all user-configurable settings organized into sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Recorder settings
    #[serde(default)]
    pub recording: RecorderConfig,
    /// Player settings
    #[serde(default)]
    pub playback: PlayerConfig,
    /// Where recordings live
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Recording storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory holding `.jsonl` recordings (default: `<data dir>/recordings`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recordings_dir: Option<PathBuf>,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("io.simreel", "", "simreel")
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\simreel\config`
/// On macOS: `~/Library/Application Support/io.simreel.simreel`
/// On Linux: `~/.config/simreel`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the platform-specific data directory.
///
/// On Linux: `~/.local/share/simreel`
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Directory recordings are read from and written to.
///
/// Uses the configured directory, then `<data dir>/recordings`, then
/// `./recordings` when no home directory is available.
pub fn recordings_dir(config: &Config) -> PathBuf {
    config
        .storage
        .recordings_dir
        .clone()
        .or_else(|| data_dir().map(|dir| dir.join("recordings")))
        .unwrap_or_else(|| PathBuf::from("recordings"))
}

/// Loads the configuration from disk.
///
/// Reads `config.toml` from the platform's configuration directory.
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    config_dir()
        .map(|dir| load_from(&dir.join(CONFIG_FILE)))
        .unwrap_or_default()
}

/// Loads the configuration from a specific file, falling back to defaults.
pub fn load_from(path: &Path) -> Config {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Config::default();
    };
    match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Saves the configuration to disk.
///
/// Writes `config.toml` to the platform's configuration directory.
/// Creates the directory if it doesn't exist.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file
/// cannot be written.
pub fn save(config: &Config) -> io::Result<()> {
    match config_dir() {
        Some(dir) => save_to(config, &dir.join(CONFIG_FILE)),
        None => Ok(()),
    }
}

/// Saves the configuration to a specific file.
pub fn save_to(config: &Config, path: &Path) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(config).map_err(io::Error::other)?;
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // =============================================================
    // Default value tests
    // =============================================================

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.recording.keyframe_interval_secs, 0.5);
        assert_eq!(config.recording.queue_capacity, 4096);
        assert_eq!(config.playback.speed, 1.0);
        assert_eq!(config.storage.recordings_dir, None);
    }

    // =============================================================
    // TOML serialization tests
    // =============================================================

    #[test]
    fn test_config_deserialize_empty() {
        // Empty TOML should produce defaults
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_deserialize_partial_recording() {
        let toml_str = r#"
[recording]
keyframe_interval_secs = 0.25
quantize_decimals = 3
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.recording.keyframe_interval_secs, 0.25);
        assert_eq!(config.recording.quantize_decimals, 3);
        assert_eq!(config.recording.warmup_secs, 0.1); // default
        assert_eq!(config.recording.join_timeout_ms, 500); // default
        assert_eq!(config.playback.speed, 1.0); // default
    }

    #[test]
    fn test_config_deserialize_storage() {
        let toml_str = r#"
[storage]
recordings_dir = "/tmp/reels"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(recordings_dir(&config), PathBuf::from("/tmp/reels"));
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = Config::default();
        config.playback.speed = 2.5;
        config.recording.queue_capacity = 64;
        save_to(&config, &path).unwrap();

        assert_eq!(load_from(&path), config);
    }

    #[test]
    fn test_load_from_missing_or_invalid_uses_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_from(&dir.path().join("absent.toml")), Config::default());

        let bad = dir.path().join(CONFIG_FILE);
        std::fs::write(&bad, "[recording\nnot toml").unwrap();
        assert_eq!(load_from(&bad), Config::default());
    }
}
