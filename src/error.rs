//! Error types for the telemetry client.

use thiserror::Error;

/// Errors raised by the telemetry client.
///
/// Only [`TelemetryError::Settings`] stops the program, and only before a
/// session starts. Every other variant is logged and the session carries on.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// An inbound push message was not well-formed JSON.
    #[error("Failed to decode message: {0}")]
    Decode(String),

    /// The push channel failed to open, was closed, or errored.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The aggregate pull failed or returned an unexpected shape.
    #[error("Metrics fetch failed: {0}")]
    Fetch(String),

    /// A sample referenced a channel outside the configured set.
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// Invalid startup configuration.
    #[error("Invalid settings: {0}")]
    Settings(String),
}

impl From<serde_json::Error> for TelemetryError {
    fn from(err: serde_json::Error) -> Self {
        TelemetryError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for TelemetryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TelemetryError::Fetch("request timed out".to_string())
        } else if err.is_decode() {
            TelemetryError::Fetch(format!("unexpected response body: {}", err))
        } else {
            TelemetryError::Fetch(err.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TelemetryError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        TelemetryError::Connection(err.to_string())
    }
}

impl From<config::ConfigError> for TelemetryError {
    fn from(err: config::ConfigError) -> Self {
        TelemetryError::Settings(err.to_string())
    }
}

impl From<url::ParseError> for TelemetryError {
    fn from(err: url::ParseError) -> Self {
        TelemetryError::Settings(format!("invalid URL: {}", err))
    }
}
