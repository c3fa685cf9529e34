//! Storage locations

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where audio, recordings and the ledger live
///
/// Unset paths resolve under the platform data directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Downloaded reference audio
    pub cache_dir: Option<PathBuf>,

    /// The user's own recordings
    pub recordings_dir: Option<PathBuf>,

    /// Audio shipped with the application
    pub bundled_dir: Option<PathBuf>,

    /// Recording ledger file
    pub ledger_file: Option<PathBuf>,

    /// Corpus document
    pub corpus_file: Option<PathBuf>,
}

/// Concrete paths after defaults are applied
#[derive(Debug, Clone, PartialEq)]
pub struct StoragePaths {
    pub cache_dir: PathBuf,
    pub recordings_dir: PathBuf,
    pub bundled_dir: PathBuf,
    pub ledger_file: PathBuf,
    pub corpus_file: PathBuf,
}

impl StorageConfig {
    /// Fills every unset path from `data_dir`
    pub fn resolve(&self, data_dir: &Path) -> StoragePaths {
        let pick = |value: &Option<PathBuf>, default: &str| {
            value.clone().unwrap_or_else(|| data_dir.join(default))
        };
        StoragePaths {
            cache_dir: pick(&self.cache_dir, "cache"),
            recordings_dir: pick(&self.recordings_dir, "recordings"),
            bundled_dir: pick(&self.bundled_dir, "bundled"),
            ledger_file: pick(&self.ledger_file, "recordings.json"),
            corpus_file: pick(&self.corpus_file, "corpus.json"),
        }
    }
}

impl ConfigSection for StorageConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = Vec::new();
        if let Some(path) = &self.ledger_file {
            results.push(Validator::not_empty(
                &path.to_string_lossy(),
                "storage.ledger_file",
            ));
        }
        if let Some(path) = &self.bundled_dir {
            if path.exists() {
                results.push(Validator::is_directory(path, "storage.bundled_dir"));
            }
        }
        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        if other.cache_dir.is_some() {
            self.cache_dir = other.cache_dir;
        }
        if other.recordings_dir.is_some() {
            self.recordings_dir = other.recordings_dir;
        }
        if other.bundled_dir.is_some() {
            self.bundled_dir = other.bundled_dir;
        }
        if other.ledger_file.is_some() {
            self.ledger_file = other.ledger_file;
        }
        if other.corpus_file.is_some() {
            self.corpus_file = other.corpus_file;
        }
    }

    fn section_name(&self) -> &'static str {
        "storage"
    }
}
