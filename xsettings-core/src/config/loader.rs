//! Configuration loading.
//!
//! [`ConfigLoader::load`] reads `xsettingsd.toml` from the NovaDE configuration
//! directory; [`ConfigLoader::load_from_path`] reads an explicit file. A missing
//! file is not an error: the defaults are used instead. Whatever is loaded goes
//! through [`ConfigLoader::validate`], which normalizes the logging options and
//! rejects out-of-range values.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories_next::ProjectDirs;
use tracing::{debug, warn};

use super::types::XSettingsConfig;
use crate::error::ConfigError;

const CONFIG_FILE_NAME: &str = "xsettingsd.toml";
const STORE_FILE_NAME: &str = "xsettings.toml";

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_FORMATS: [&str; 2] = ["text", "json"];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the configuration from the default location.
    pub fn load() -> Result<XSettingsConfig, ConfigError> {
        let path = Self::default_config_path()?;
        Self::load_from_path(&path)
    }

    /// Loads and validates the configuration stored at `path`.
    ///
    /// Falls back to [`XSettingsConfig::default`] if the file does not exist.
    pub fn load_from_path(path: &Path) -> Result<XSettingsConfig, ConfigError> {
        let config = match fs::read_to_string(path) {
            Ok(content) => {
                debug!("Loading configuration from {:?}", path);
                toml::from_str::<XSettingsConfig>(&content)?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Configuration file {:?} not found, using defaults", path);
                XSettingsConfig::default()
            }
            Err(source) => {
                return Err(ConfigError::ReadError { path: path.to_path_buf(), source });
            }
        };
        Self::validate(config)
    }

    /// Normalizes and checks a parsed configuration.
    pub fn validate(mut config: XSettingsConfig) -> Result<XSettingsConfig, ConfigError> {
        let level = config.logging.level.to_lowercase();
        if !VALID_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}', expected one of {:?}",
                config.logging.level, VALID_LEVELS
            )));
        }
        config.logging.level = level;

        let format = config.logging.format.to_lowercase();
        if !VALID_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log format '{}', expected one of {:?}",
                config.logging.format, VALID_FORMATS
            )));
        }
        config.logging.format = format;

        if config.scale.base_dpi == 0 {
            return Err(ConfigError::ValidationError("scale.base_dpi must be positive".to_string()));
        }

        Ok(config)
    }

    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        Ok(project_dirs()?.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Where the secondary store lives when `store.path` is not configured.
    pub fn default_store_path() -> Result<PathBuf, ConfigError> {
        Ok(project_dirs()?.config_dir().join(STORE_FILE_NAME))
    }
}

impl XSettingsConfig {
    /// The configured store path, or the default one.
    pub fn store_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => ConfigLoader::default_store_path(),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("org", "NovaDE", "novade").ok_or_else(|| ConfigError::DirectoryUnavailable {
        dir_type: "XDG_CONFIG_HOME".to_string(),
    })
}
