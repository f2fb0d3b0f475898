//! Application configuration module
//!
//! Resolves where preferences live on disk using `directories` for the
//! OS-specific data directory.

use crate::constant::{APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, PREFERENCES_FILE};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    data_dir: PathBuf,
}

impl Config {
    /// Resolve the platform data directory and make sure it exists
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::default();
        fs::create_dir_all(&config.data_dir)?;
        info!("Using data directory {:?}", config.data_dir);
        Ok(config)
    }

    /// Use an explicit directory instead of the platform one
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Get the application data directory
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    /// Get the preferences file path
    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(PREFERENCES_FILE)
    }
}

impl Default for Config {
    /// Falls back to a local "data" directory if platform dirs are unavailable
    fn default() -> Self {
        let data_dir =
            if let Some(proj_dirs) = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME) {
                proj_dirs.data_dir().to_path_buf()
            } else {
                PathBuf::from("data")
            };
        Self { data_dir }
    }
}
