//! verserec configuration system
//!
//! Session configuration is an explicit struct handed to the components that
//! need it at construction. Sections implement [`ConfigSection`]; changes
//! the player makes at runtime flow back through [`PreferenceStore`].
//!
//! # Example
//!
//! ```rust,no_run
//! use verserec_config::ConfigManager;
//!
//! # fn main() -> verserec_config::ConfigResult<()> {
//! let manager = ConfigManager::new()?;
//! let config = manager.load_or_default();
//! let paths = manager.storage_paths(&config);
//! println!("{} from {}", config.player.rate, paths.cache_dir.display());
//! # Ok(())
//! # }
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

pub mod preferences;

// Config sections
mod network_config;
mod player_config;
mod profile_config;
mod storage_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::ConfigManager;
pub use preferences::{MemoryPreferences, PreferenceChange, PreferenceStore};
pub use validation::{ConfigSection, Validator};

pub use network_config::{NetworkConfig, DEFAULT_METADATA_BASE_URL, DEFAULT_UPLOAD_ENDPOINT};
pub use player_config::PlayerConfig;
pub use profile_config::ProfileConfig;
pub use storage_config::{StorageConfig, StoragePaths};

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    /// Playback preferences and the last position
    pub player: PlayerConfig,
    pub storage: StorageConfig,
    pub network: NetworkConfig,
    /// Who uploads are attributed to
    pub profile: ProfileConfig,
}

impl Config {
    /// Collects the errors of every section
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = [
            self.player.validate(),
            self.storage.validate(),
            self.network.validate(),
            self.profile.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .flatten()
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Section-wise overwrite with `other`
    pub fn merge(&mut self, other: Config) {
        let Config {
            version: _,
            player,
            storage,
            network,
            profile,
        } = other;
        self.player.merge(player);
        self.storage.merge(storage);
        self.network.merge(network);
        self.profile.merge(profile);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            player: PlayerConfig::default(),
            storage: StorageConfig::default(),
            network: NetworkConfig::default(),
            profile: ProfileConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_takes_other_sections() {
        let mut base = Config::default();
        let mut other = Config::default();
        other.player.repeat_range = true;
        other.profile.user_id = "42".to_string();

        base.merge(other);
        assert!(base.player.repeat_range);
        assert_eq!(base.profile.user_id, "42");
    }

    #[test]
    fn test_errors_from_every_section_are_collected() {
        let mut config = Config::default();
        config.network.timeout_secs = 0;
        config.profile.user_id = String::new();
        assert_eq!(config.validate().unwrap_err().len(), 2);
    }
}
