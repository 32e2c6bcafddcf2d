//! Configuration loading and folder resolution
//!
//! Bootstrap settings come from a small TOML file. Every folder and the tag
//! resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable config file is never fatal; it is logged and the
//! next tier is used.

use crate::{time, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const STORAGE_ENV: &str = "SURVEY_STORAGE";
pub const TEMP_ENV: &str = "SURVEY_TEMP";
pub const TAG_ENV: &str = "SURVEY_TAG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root of the per-tag result folders
    #[serde(default)]
    pub storage: Option<PathBuf>,

    /// Scratch folder for reports and bundles
    #[serde(default)]
    pub temp: Option<PathBuf>,

    /// Run tag
    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load a config file
    ///
    /// With no explicit path the platform config locations are searched, and
    /// finding none there yields the defaults. An explicit path that cannot be
    /// read or parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_file() {
                Ok(p) => p,
                Err(e) => {
                    debug!("No config file: {}", e);
                    return Ok(Self::default());
                }
            },
        };
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Unable to read config {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{} ({})", e, path.display())))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// [`load`](Self::load), falling back to defaults when the file is absent or broken
    pub fn load_or_default(path: Option<&Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("Ignoring config: {}", e);
            Self::default()
        })
    }
}

/// Folder/tag overrides given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub storage: Option<PathBuf>,
    pub temp: Option<PathBuf>,
    pub tag: Option<String>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub storage: PathBuf,
    pub temp: PathBuf,
    pub tag: String,
    pub log_level: String,
}

impl Settings {
    pub fn resolve(overrides: &Overrides, config: &TomlConfig) -> Self {
        let storage = resolve_folder(
            overrides.storage.as_deref(),
            STORAGE_ENV,
            config.storage.as_deref(),
            default_storage_folder,
        );
        let temp = resolve_folder(
            overrides.temp.as_deref(),
            TEMP_ENV,
            config.temp.as_deref(),
            default_temp_folder,
        );
        let tag = overrides
            .tag
            .clone()
            .or_else(|| std::env::var(TAG_ENV).ok().filter(|t| !t.trim().is_empty()))
            .or_else(|| config.tag.clone().filter(|t| !t.trim().is_empty()))
            .unwrap_or_else(time::time_string);
        Self {
            storage,
            temp,
            tag,
            log_level: config.logging.level.clone(),
        }
    }

    /// Folder holding the tag's result files and manifest
    pub fn tag_directory(&self) -> PathBuf {
        self.storage.join(&self.tag)
    }

    /// Create the tag and temp folders if missing
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [self.tag_directory(), self.temp.clone()] {
            std::fs::create_dir_all(&dir)
                .map_err(|e| Error::Config(format!("unable to create {}: {}", dir.display(), e)))?;
        }
        Ok(())
    }
}

/// Pick the first available folder by priority
pub fn resolve_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config_value: Option<&Path>,
    default: fn() -> PathBuf,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = config_value {
        return path.to_path_buf();
    }

    // Priority 4: OS-dependent compiled default
    default()
}

/// Platform config file: `~/.config/survey/config.toml`, then `/etc/survey/config.toml`
pub fn default_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("survey").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }
    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/survey/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }
    Err(Error::Config("No config file found".to_string()))
}

fn default_storage_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("survey").join("storage"))
        .unwrap_or_else(|| PathBuf::from("./survey_data/storage"))
}

fn default_temp_folder() -> PathBuf {
    std::env::temp_dir().join("survey")
}
