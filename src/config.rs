//! Startup settings.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional TOML file, and `PULSEBOARD_*` environment variables. The
//! binary applies command-line overrides on top.
//!
//! ```toml
//! server = "https://telemetry.example.com"
//! channels = ["Genetic", "Biochemical", "Physical"]
//! window_capacity = 50
//! alert_capacity = 10
//! retry_delay = "3s"
//! poll_interval = "2s"
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};

use crate::data::duration::parse_duration;
use crate::data::{ChannelSet, DEFAULT_ALERT_CAPACITY, DEFAULT_CHANNELS, DEFAULT_WINDOW_CAPACITY};
use crate::error::TelemetryError;
use crate::source::{
    Endpoints, DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_DELAY,
};

const ENV_PREFIX: &str = "PULSEBOARD";

/// Client settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend base URL; `http` or `https`.
    pub server: String,
    pub push_path: String,
    pub metrics_path: String,
    pub channels: Vec<String>,
    pub window_capacity: usize,
    pub alert_capacity: usize,
    #[serde(deserialize_with = "duration_string")]
    pub retry_delay: Duration,
    #[serde(deserialize_with = "duration_string")]
    pub poll_interval: Duration,
    #[serde(deserialize_with = "duration_string")]
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: "http://127.0.0.1:8000".to_string(),
            push_path: "/ws".to_string(),
            metrics_path: "/api/metrics".to_string(),
            channels: DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect(),
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            alert_capacity: DEFAULT_ALERT_CAPACITY,
            retry_delay: DEFAULT_RETRY_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Settings {
    /// Load settings from the environment and, if given, a config file.
    ///
    /// Values are not validated here; callers apply their overrides first and
    /// then call [`Settings::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self, TelemetryError> {
        Self::load_from(path, environment())
    }

    fn load_from(path: Option<&Path>, env: Environment) -> Result<Self, TelemetryError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings: Settings = builder.add_source(env).build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Check everything a session needs before it starts.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        self.endpoints()?;
        self.channel_set()?;

        if self.window_capacity == 0 {
            return Err(TelemetryError::Settings(
                "window_capacity must be at least 1".to_string(),
            ));
        }
        if self.alert_capacity == 0 {
            return Err(TelemetryError::Settings(
                "alert_capacity must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("retry_delay", self.retry_delay),
            ("poll_interval", self.poll_interval),
            ("request_timeout", self.request_timeout),
        ] {
            if value.is_zero() {
                return Err(TelemetryError::Settings(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }

    pub fn channel_set(&self) -> Result<ChannelSet, TelemetryError> {
        ChannelSet::new(&self.channels)
    }

    pub fn endpoints(&self) -> Result<Endpoints, TelemetryError> {
        Endpoints::from_base(&self.server, &self.push_path, &self.metrics_path)
    }
}

/// `PULSEBOARD_WINDOW_CAPACITY=20`, `PULSEBOARD_CHANNELS=Thermal,Optical`
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("channels")
}

fn duration_string<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}
