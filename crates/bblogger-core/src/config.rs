//! Run configuration.
//!
//! Everything here is built once at startup and passed by reference into the
//! session, reader and scheduler; nothing is mutated afterwards.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::driver::ModemModel;

/// Configuration errors. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Where and as whom to log in. Immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Modem address, `host` or `host:port`.
    pub host: String,
    pub account: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(
        host: impl Into<String>,
        account: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            account: account.into(),
            password: SecretString::new(password.into()),
        }
    }
}

/// Network timing for one management session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Bound on establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Bound on every wait for a prompt.
    pub read_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
        }
    }
}

/// Observation window.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Total logging time, measured from the first cycle.
    pub duration: Duration,
    /// Time between the starts of consecutive cycles.
    pub interval: Duration,
    /// Start a new output destination whenever the calendar date changes.
    pub rotate_daily: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(24 * 3600),
            interval: Duration::from_secs(15 * 60),
            rotate_daily: false,
        }
    }
}

impl PollConfig {
    /// Builds a window from whole hours and minutes, as taken on the command
    /// line.
    pub fn from_hours_minutes(
        hours: u64,
        minutes: u64,
        rotate_daily: bool,
    ) -> Result<Self, ConfigError> {
        if hours == 0 {
            return Err(ConfigError::Zero("duration"));
        }
        if minutes == 0 {
            return Err(ConfigError::Zero("interval"));
        }
        Ok(Self {
            duration: Duration::from_secs(hours * 3600),
            interval: Duration::from_secs(minutes * 60),
            rotate_daily,
        })
    }
}

/// Per-host settings from the hosts file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostEntry {
    pub account: Option<String>,
    pub password: Option<SecretString>,
    pub model: Option<ModemModel>,
    pub port: Option<u16>,
}

/// TOML file keyed by modem address:
///
/// ```toml
/// [hosts."192.168.1.1"]
/// account = "admin"
/// password = "secret"
/// model = "vigor130"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostsFile {
    #[serde(default)]
    hosts: HashMap<String, HostEntry>,
}

impl HostsFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn lookup(&self, host: &str) -> Option<&HostEntry> {
        self.hosts.get(host)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }
}
