use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4096;
const DEFAULT_USERNAME: &str = "opencode";

/// Default timeout for a single backend request (30 seconds).
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_HOST: &str = "OPENCODE_SERVER_HOST";
pub const ENV_PORT: &str = "OPENCODE_SERVER_PORT";
pub const ENV_USERNAME: &str = "OPENCODE_SERVER_USERNAME";
pub const ENV_PASSWORD: &str = "OPENCODE_SERVER_PASSWORD";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "OHO_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{name} must be {expected}, got {value:?}")]
    InvalidEnv {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Connection settings for the OpenCode Server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            username: DEFAULT_USERNAME.into(),
            password: String::new(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Contents of `config.json`. Absent keys leave the current value alone;
/// unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line; they win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ClientConfig {
    /// Load configuration: defaults, then environment, then the config
    /// file, then command-line overrides.
    ///
    /// An explicit `config_path` must exist. The default location
    /// (`<config dir>/oho/config.json`) is skipped when absent.
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;

        match config_path {
            Some(path) => config.apply_file(&FileConfig::read(path)?),
            None => {
                if let Some(path) = default_config_path().filter(|p| p.is_file()) {
                    tracing::debug!(path = %path.display(), "loading config file");
                    config.apply_file(&FileConfig::read(&path)?);
                }
            }
        }

        config.apply_overrides(overrides);
        Ok(config)
    }

    /// Apply environment variables through `lookup`. Empty values are
    /// treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(host) = get(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = get(ENV_PORT) {
            self.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_PORT,
                expected: "a port number",
                value: port,
            })?;
        }
        if let Some(username) = get(ENV_USERNAME) {
            self.username = username;
        }
        if let Some(password) = get(ENV_PASSWORD) {
            self.password = password;
        }
        if let Some(secs) = get(ENV_REQUEST_TIMEOUT_SECS) {
            let parsed: u64 = secs.parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_REQUEST_TIMEOUT_SECS,
                expected: "a positive integer",
                value: secs.clone(),
            })?;
            if parsed == 0 {
                return Err(ConfigError::InvalidEnv {
                    name: ENV_REQUEST_TIMEOUT_SECS,
                    expected: "a positive integer",
                    value: secs,
                });
            }
            self.request_timeout = Duration::from_secs(parsed);
        }
        Ok(())
    }

    pub fn apply_file(&mut self, file: &FileConfig) {
        if let Some(host) = file.host.as_ref().filter(|h| !h.is_empty()) {
            self.host = host.clone();
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(username) = file.username.as_ref().filter(|u| !u.is_empty()) {
            self.username = username.clone();
        }
        if let Some(password) = &file.password {
            self.password = password.clone();
        }
        if let Some(secs) = file.request_timeout_secs.filter(|s| *s > 0) {
            self.request_timeout = Duration::from_secs(secs);
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(host) = &overrides.host {
            self.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(username) = &overrides.username {
            self.username = username.clone();
        }
        if let Some(password) = &overrides.password {
            self.password = password.clone();
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Basic-auth credentials, present only when both username and password
    /// are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.username.is_empty() || self.password.is_empty() {
            None
        } else {
            Some((self.username.as_str(), self.password.as_str()))
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("oho").join("config.json"))
}
