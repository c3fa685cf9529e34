//! Locating, loading and updating the config file

use crate::persistence::ConfigPersistence;
use crate::storage_config::StoragePaths;
use crate::{Config, ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use verserec_core::PlaybackRate;

/// Loads, saves and locates the configuration
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager rooted in the platform directories
    ///
    /// - Linux: `~/.config/verserec/` and `~/.local/share/verserec/`
    /// - macOS: `~/Library/Application Support/verserec/`
    /// - Windows: `%APPDATA%\verserec\`
    pub fn new() -> ConfigResult<Self> {
        let dirs = ProjectDirs::from("", "", "verserec").ok_or_else(|| {
            ConfigError::NoConfigDirectory("home directory not found".to_string())
        })?;
        Ok(Self::with_directories(
            dirs.config_dir().to_path_buf(),
            dirs.data_dir().to_path_buf(),
        ))
    }

    /// Creates a manager that keeps config and data in one directory
    pub fn with_directory(dir: PathBuf) -> ConfigResult<Self> {
        Ok(Self::with_directories(dir.clone(), dir))
    }

    pub fn with_directories(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        let persistence = ConfigPersistence::new(config_dir.join("config.toml"));
        Self {
            persistence,
            config_dir,
            data_dir,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.persistence.path().to_path_buf()
    }

    /// Storage paths for `config` with defaults under the data directory
    pub fn storage_paths(&self, config: &Config) -> StoragePaths {
        config.storage.resolve(&self.data_dir)
    }

    /// Loads the configuration; a missing file yields defaults
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Like [`load`](Self::load), but an unreadable file only costs a warning
    pub fn load_or_default(&self) -> Config {
        self.load().unwrap_or_else(|e| {
            log::warn!("{}; continuing with default settings", e);
            Config::default()
        })
    }

    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Read-modify-write of the stored config
    pub fn update(&self, edit: impl FnOnce(&mut Config)) -> ConfigResult<()> {
        let mut config = self.load()?;
        edit(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if none exists
    ///
    /// Returns `Ok(true)` if a file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        let path = self.persistence.path();
        if path.exists() {
            log::debug!("Keeping existing {}", path.display());
            return Ok(false);
        }

        self.save(&Config::default())?;
        log::info!("Generated default config at {}", path.display());
        Ok(true)
    }

    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Returns every validation problem in the stored config
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the config and applies `VERSEREC_SECTION_FIELD` overrides
    ///
    /// Supported: `VERSEREC_PLAYER_RATE`, `VERSEREC_PLAYER_REPEAT`,
    /// `VERSEREC_NETWORK_UPLOAD_ENDPOINT`.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }
}

fn apply_env_overrides<F>(config: &mut Config, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(rate) = var("VERSEREC_PLAYER_RATE") {
        match rate.parse::<f32>().map(PlaybackRate::new) {
            Ok(Ok(rate)) => config.player.rate = rate,
            _ => log::warn!("Ignoring VERSEREC_PLAYER_RATE={}", rate),
        }
    }

    if let Some(repeat) = var("VERSEREC_PLAYER_REPEAT") {
        match repeat.parse::<bool>() {
            Ok(repeat) => config.player.repeat_range = repeat,
            Err(_) => log::warn!("Ignoring VERSEREC_PLAYER_REPEAT={}", repeat),
        }
    }

    if let Some(endpoint) = var("VERSEREC_NETWORK_UPLOAD_ENDPOINT") {
        config.network.upload_endpoint = endpoint;
    }
}
