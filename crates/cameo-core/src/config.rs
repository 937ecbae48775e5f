//! Configuration file discovery and loading
//!
//! A project may carry a `cameo` config next to its schema exports. Every
//! field is optional; command-line flags override whatever is set here.

use crate::error::{CameoError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file names, in discovery priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".cameorc.json",
    ".cameorc.toml",
    "cameo.yaml",
    "cameo.yml",
    "cameo.json",
];

/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "out";
/// Default persisted code-system table
pub const DEFAULT_CODESYSTEMS_PATH: &str = "config/codesystems.json";

/// Converter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameoConfig {
    /// Persisted identifier → abbreviation table
    pub codesystems: PathBuf,
    /// Directory grammar files are written to
    pub output: PathBuf,
    /// Write newly allocated abbreviations back to `codesystems`
    pub persist_codesystems: bool,
    pub trailing_newline: bool,
}

impl Default for CameoConfig {
    fn default() -> Self {
        Self {
            codesystems: PathBuf::from(DEFAULT_CODESYSTEMS_PATH),
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
            persist_codesystems: false,
            trailing_newline: true,
        }
    }
}

impl CameoConfig {
    /// Parse a config file, choosing the format by extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| CameoError::io(path, e))?;
        let ext = path.extension().and_then(|e| e.to_str());

        let parsed = match ext {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
            Some("toml") => toml::from_str(&content).map_err(|e| e.to_string()),
            Some("json") => serde_json::from_str(&content).map_err(|e| e.to_string()),
            _ => Err("unsupported file extension (expected .json, .toml, .yaml or .yml)".to_string()),
        };

        parsed.map_err(|message| CameoError::ConfigError {
            message: format!("Failed to load config from '{}': {}", path.display(), message),
        })
    }

    /// Resolve relative paths against the directory holding the config file
    pub fn relative_to(mut self, base: &Path) -> Self {
        if self.codesystems.is_relative() {
            self.codesystems = base.join(&self.codesystems);
        }
        if self.output.is_relative() {
            self.output = base.join(&self.output);
        }
        self
    }
}

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover a config file by traversing upward from `start_path`
    ///
    /// Each directory is searched for the names in [`CONFIG_FILE_NAMES`]
    /// before moving to its parent, until the filesystem root is reached.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| CameoError::ConfigError {
                message: format!("Invalid path: {e}"),
            })?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load config from an explicit path or auto-discover one
    ///
    /// An explicit path must exist. When discovery finds nothing the
    /// defaults are returned. Relative paths inside a discovered file are
    /// resolved against that file's directory.
    pub fn load(custom_path: Option<&Path>, start_dir: &Path) -> Result<CameoConfig> {
        let config_path = match custom_path {
            Some(path) if !path.is_file() => {
                return Err(CameoError::ConfigError {
                    message: format!("Config file not found: {}", path.display()),
                });
            }
            Some(path) => path.to_path_buf(),
            None => match Self::auto_discover(start_dir)? {
                Some(path) => path,
                None => {
                    debug!("No config file found, using defaults");
                    return Ok(CameoConfig::default());
                }
            },
        };

        let config = CameoConfig::load(&config_path)?;
        Ok(match config_path.parent() {
            Some(base) if !base.as_os_str().is_empty() => config.relative_to(base),
            _ => config,
        })
    }
}
