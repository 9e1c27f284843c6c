use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{NottifError, Result};
use crate::types::MAX_EVENTS;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Top-level config (nottif.toml + NOTTIF_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NottifConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Where the backend lives and how long REST calls may take.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Applied to each REST request. The event stream is long-lived and only
    /// bound by the connect timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Upper bound on the displayed event log.
    #[serde(default = "default_max_displayed")]
    pub max_displayed: usize,
    /// Which message contract the live event stream follows.
    #[serde(default)]
    pub payload: PayloadShape,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            max_displayed: MAX_EVENTS,
            payload: PayloadShape::default(),
        }
    }
}

/// Shape of each message on the live event stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadShape {
    /// Every message is the full, already-capped event log.
    #[default]
    Snapshot,
    /// Every message is a single new event to put on top of the log.
    Incremental,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub clock: ClockZone,
}

/// Zone used when turning event timestamps into a time of day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockZone {
    #[default]
    Local,
    Utc,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}
fn default_max_displayed() -> usize {
    MAX_EVENTS
}

impl NottifConfig {
    /// Load config from a TOML file with NOTTIF_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.nottif/nottif.toml
    ///
    /// A missing file is not an error; every key has a default. Nested keys in
    /// the environment use a double underscore: `NOTTIF_SERVER__BASE_URL`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: NottifConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("NOTTIF_").split("__"))
            .extract()
            .map_err(|e| NottifError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.server.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(NottifError::Config(format!(
                "server.base_url must be an http(s) URL, got {url:?}"
            )));
        }
        if self.events.max_displayed == 0 {
            return Err(NottifError::Config(
                "events.max_displayed must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.nottif/nottif.toml", home)
}
