//! Reading and writing `config.toml`

use crate::error::describe;
use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct ConfigPersistence {
    config_path: PathBuf,
}

impl ConfigPersistence {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Reads the config file, or the defaults when there is none yet
    ///
    /// Out-of-range values are only logged so that `config show` still works
    /// on a file the user has to fix by hand.
    pub fn load(&self) -> ConfigResult<Config> {
        let text = match fs::read_to_string(&self.config_path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", self.config_path.display());
                return Ok(Config::default());
            }
            Err(e) => return Err(ConfigError::io("read", &self.config_path, e)),
        };

        if text.trim().is_empty() {
            let empty = std::io::Error::new(std::io::ErrorKind::InvalidData, "file is empty");
            return Err(ConfigError::io("read", &self.config_path, empty));
        }

        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.config_path.clone(),
            source,
        })?;

        if config.version > CONFIG_VERSION {
            log::warn!(
                "{} was written by a newer version ({} > {})",
                self.config_path.display(),
                config.version,
                CONFIG_VERSION
            );
        }
        if let Err(errors) = config.validate() {
            log::warn!("{}: {}", self.config_path.display(), describe(&errors));
        }

        Ok(config)
    }

    /// Refuses invalid configs; otherwise replaces the file in one rename
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        config
            .validate()
            .map_err(|errors| ConfigError::invalid(&errors))?;

        let text = toml::to_string_pretty(config)?;
        let dir = match self.config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| ConfigError::io("create", dir, e))?;

        let mut staged =
            NamedTempFile::new_in(dir).map_err(|e| ConfigError::io("stage", dir, e))?;
        staged
            .write_all(text.as_bytes())
            .and_then(|()| staged.flush())
            .map_err(|e| ConfigError::io("write", staged.path(), e))?;
        staged
            .persist(&self.config_path)
            .map_err(|e| ConfigError::io("replace", &self.config_path, e.error))?;

        log::debug!("Wrote {}", self.config_path.display());
        Ok(())
    }
}
