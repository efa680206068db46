//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/compass/compass.toml`
//! 3. Explicit config file (`--config <file>`)
//! 4. Environment variables: `COMPASS_*` prefix, `__` between sections

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// `host:port`, as accepted by a socket bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Unified configuration for compass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// JSON snapshot holding divisions, customers and the catalog
    pub data_file: PathBuf,
    pub server: ServerConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            server: ServerConfig::default(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "compass")
}

/// `<XDG data dir>/compass/compass.json`, or `./compass.json` without a home.
fn default_data_file() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("compass.json"))
        .unwrap_or_else(|| PathBuf::from("compass.json"))
}

/// Get the XDG config directory for compass.
pub fn global_config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("compass.toml"))
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// A missing global file is skipped; an explicit file that does not exist
    /// is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.exists());
        Self::load_from(global.as_deref(), explicit)
    }

    /// Same as [`Settings::load`] with the global file given explicitly.
    pub fn load_from(
        global: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("data_file", defaults.data_file.to_string_lossy().to_string())
            .map_err(config_err)?
            .set_default("server.host", defaults.server.host.clone())
            .map_err(config_err)?
            .set_default("server.port", i64::from(defaults.server.port))
            .map_err(config_err)?;

        if let Some(path) = global {
            debug!("global config: {}", path.display());
            builder = builder.add_source(File::from(path).required(false));
        }
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            debug!("explicit config: {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("COMPASS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.expand_paths()?;
        Ok(settings)
    }

    /// Expand `~`, `$VAR` and `${VAR}` in `data_file`.
    fn expand_paths(&mut self) -> Result<(), ApplicationError> {
        let raw = self.data_file.to_string_lossy().to_string();
        let expanded = shellexpand::full(&raw).map_err(|e| ApplicationError::Config {
            message: format!("expand data_file {raw}: {e}"),
        })?;
        self.data_file = PathBuf::from(expanded.as_ref());
        Ok(())
    }

    /// Settings rendered as TOML, for `config show`.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("render settings: {e}"),
        })
    }
}
