//! Camera registry configuration.
//!
//! Maps a camera identifier to its connection settings. Two formats are read:
//! TOML (`[cameras.<name>]` tables) and the legacy flat `cameras.json` object
//! keyed directly by camera name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cgi::{Endpoint, EndpointBuilder};
use crate::error::{AppError, Result};

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(CamerasConfig),
    /// Config file missing.
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse JSON config: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// All known cameras, keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CamerasConfig {
    #[serde(default)]
    pub cameras: BTreeMap<String, CameraConfig>,
}

/// Connection settings for one camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub host: String,
    pub port: u16,
    pub login: String,
    #[serde(default)]
    pub password: String,
    /// Force TLS on or off. Unset means TLS only on port 443.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<bool>,
    #[serde(default)]
    pub verbose: bool,
    /// Send commands without waiting for the reply.
    #[serde(default)]
    pub daemon: bool,
    /// Accept self-signed certificates (default: true).
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

fn default_accept_invalid_certs() -> bool {
    true
}

/// File format, picked from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

impl CamerasConfig {
    /// Default config path: `cameras.toml` in the user config directory,
    /// falling back to the directory of the executable.
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = ProjectDirs::from("", "", "foscam-cgi") {
            return dirs.config_dir().join("cameras.toml");
        }
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cameras.toml")
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::parse(&content, Format::of(path)) {
                Ok(config) => match config.validate() {
                    Ok(()) => ConfigLoadResult::Loaded(config),
                    Err(e) => ConfigLoadResult::Invalid(e),
                },
                Err(e) => ConfigLoadResult::Invalid(e),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Load config, treating a missing file as an error.
    pub fn load(path: &Path) -> std::result::Result<Self, ConfigError> {
        match Self::try_load(path) {
            ConfigLoadResult::Loaded(config) => Ok(config),
            ConfigLoadResult::Missing => Err(ConfigError::Read(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            ))),
            ConfigLoadResult::Invalid(e) => Err(e),
        }
    }

    fn parse(content: &str, format: Format) -> std::result::Result<Self, ConfigError> {
        match format {
            Format::Toml => Ok(toml::from_str(content)?),
            Format::Json => {
                let cameras: BTreeMap<String, CameraConfig> = serde_json::from_str(content)?;
                Ok(Self { cameras })
            }
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (name, camera) in &self.cameras {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation("Camera name cannot be empty".to_string()));
            }
            if camera.host.trim().is_empty() {
                return Err(ConfigError::Validation(format!("Camera '{name}': host cannot be empty")));
            }
            if camera.port == 0 {
                return Err(ConfigError::Validation(format!(
                    "Camera '{name}': port must be greater than 0"
                )));
            }
            if camera.login.is_empty() {
                return Err(ConfigError::Validation(format!("Camera '{name}': login cannot be empty")));
            }
        }
        Ok(())
    }

    /// Save configuration to file, in the format matching its extension.
    pub fn save(&self, path: &Path) -> std::result::Result<(), ConfigError> {
        let content = match Format::of(path) {
            Format::Toml => toml::to_string_pretty(self)?,
            Format::Json => serde_json::to_string_pretty(&self.cameras)?,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn camera(&self, name: &str) -> Result<&CameraConfig> {
        self.cameras.get(name).ok_or_else(|| AppError::unknown_camera(name))
    }

    /// Resolve a camera into a ready-to-use endpoint.
    pub fn endpoint(&self, name: &str) -> Result<Endpoint> {
        self.camera(name)?.to_endpoint()
    }
}

impl CameraConfig {
    /// Builder carrying every setting of this camera, for callers that override some.
    pub fn endpoint_builder(&self) -> EndpointBuilder {
        Endpoint::builder(&self.host, self.port, &self.login, &self.password)
            .tls_override(self.ssl)
            .verbose(self.verbose)
            .detached(self.daemon)
            .accept_invalid_certs(self.accept_invalid_certs)
    }

    pub fn to_endpoint(&self) -> Result<Endpoint> {
        self.endpoint_builder().build()
    }
}
