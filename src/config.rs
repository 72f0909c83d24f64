//! Tracker configuration.
//!
//! Read from a TOML file or from `TIMETABLE_*` environment variables.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    api::session::Session,
    backend::rest::{self, Server},
    tracking::poller::DEFAULT_POLL_INTERVAL,
};

pub const ENV_API_URL: &str = "TIMETABLE_API_URL";
pub const ENV_POLL_INTERVAL_MS: &str = "TIMETABLE_POLL_INTERVAL_MS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "TIMETABLE_REQUEST_TIMEOUT_MS";
pub const ENV_TOKEN: &str = "TIMETABLE_TOKEN";
pub const ENV_TOKEN_FILE: &str = "TIMETABLE_TOKEN_FILE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no api url configured, set TIMETABLE_API_URL")]
    MissingApiUrl,
    #[error("{name} must be a number of milliseconds, found {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to load the session token: {0:?}")]
    Session(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackerConfig {
    pub api_url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_request_timeout_ms() -> u64 {
    rest::DEFAULT_TIMEOUT.as_millis() as u64
}

impl TrackerConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        TrackerConfig {
            api_url: api_url.into(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            token: None,
            token_file: None,
        }
    }

    pub fn from_toml_str(config: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(config)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        TrackerConfig::from_toml_str(&config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        TrackerConfig::from_vars(|name| env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = var(ENV_API_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingApiUrl)?;
        let mut config = TrackerConfig::new(api_url);
        if let Some(value) = var(ENV_POLL_INTERVAL_MS) {
            config.poll_interval_ms = parse_millis(ENV_POLL_INTERVAL_MS, value)?;
        }
        if let Some(value) = var(ENV_REQUEST_TIMEOUT_MS) {
            config.request_timeout_ms = parse_millis(ENV_REQUEST_TIMEOUT_MS, value)?;
        }
        config.token = var(ENV_TOKEN);
        config.token_file = var(ENV_TOKEN_FILE).map(PathBuf::from);
        Ok(config)
    }

    /// The poll cadence; `0` falls back to the default.
    pub fn poll_interval(&self) -> Duration {
        match self.poll_interval_ms {
            0 => DEFAULT_POLL_INTERVAL,
            millis => Duration::from_millis(millis),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_ms {
            0 => rest::DEFAULT_TIMEOUT,
            millis => Duration::from_millis(millis),
        }
    }

    /// An inline token wins over the token file.
    pub fn session(&self) -> Result<Session, ConfigError> {
        match (&self.token, &self.token_file) {
            (Some(token), _) => Ok(Session::with_token(token.as_str())),
            (None, Some(path)) => Session::from_token_file(path).map_err(ConfigError::Session),
            (None, None) => Ok(Session::anonymous()),
        }
    }

    pub fn server(&self) -> Result<Server, ConfigError> {
        Ok(Server::new(self.api_url.as_str())
            .with_session(self.session()?)
            .with_timeout(self.request_timeout()))
    }
}

fn parse_millis(name: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { name, value })
}
