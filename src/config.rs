//! Runtime Configuration
//!
//! Recognized options for the scripting subsystem, loaded from an optional
//! TOML file merged with environment overrides. Absence of the script folder
//! while hot reload is enabled is a startup-fatal error.

use crate::error::LoaderError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration of the script loaders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Whether the watch loops run at all.
    pub hot_reload: bool,
    /// Folder containing the script source files.
    pub folder: PathBuf,
    /// Seconds between directory scans.
    pub poll_interval_secs: u64,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            hot_reload: false,
            folder: PathBuf::from("/agents"),
            poll_interval_secs: 180,
        }
    }
}

impl ScriptsConfig {
    /// Load configuration with precedence: environment (`PARLEY_SCRIPTS_*`),
    /// then the given file, then defaults.
    pub fn load(file: Option<&Path>) -> Result<Self, LoaderError> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("hot_reload", defaults.hot_reload)
            .map_err(config_error)?
            .set_default("folder", defaults.folder.to_string_lossy().to_string())
            .map_err(config_error)?
            .set_default("poll_interval_secs", defaults.poll_interval_secs)
            .map_err(config_error)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path.to_path_buf()));
        }
        builder = builder.add_source(Environment::with_prefix("PARLEY_SCRIPTS").try_parsing(true));

        builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(config_error)
    }

    /// The poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Reject configurations that cannot be started.
    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.hot_reload && !self.folder.is_dir() {
            return Err(LoaderError::Config(format!(
                "hot reload enabled but script folder does not exist: {}",
                self.folder.display()
            )));
        }
        Ok(())
    }
}

fn config_error(e: config::ConfigError) -> LoaderError {
    LoaderError::Config(e.to_string())
}
