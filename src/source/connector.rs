//! Push-channel transport.
//!
//! The supervisor only needs "open a connection, then read text frames until
//! it ends". [`Connector`] captures exactly that so the reconnect logic can be
//! exercised without a network; [`WsConnector`] is the WebSocket
//! implementation used by the binary.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future;
use futures_util::stream::{BoxStream, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;
use url::Url;

use crate::error::TelemetryError;
use crate::source::poller::DEFAULT_REQUEST_TIMEOUT;

/// Text frames from one open connection.
///
/// The stream ends (or yields an error) when the connection closes.
pub type FrameStream = BoxStream<'static, Result<String, TelemetryError>>;

/// Opens push-channel connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new connection.
    async fn connect(&self) -> Result<FrameStream, TelemetryError>;

    /// Human-readable endpoint, for logs and the status bar.
    fn description(&self) -> &str;
}

/// Push and pull URLs derived from one backend base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// WebSocket endpoint (`ws://` or `wss://`).
    pub push: Url,
    /// Aggregate metrics endpoint (`http://` or `https://`).
    pub metrics: Url,
}

impl Endpoints {
    /// Derive both endpoints from the backend base URL.
    ///
    /// The push channel uses the secure scheme when the base URL does:
    /// `http` becomes `ws`, `https` becomes `wss`. A `ws`/`wss` base is also
    /// accepted and mapped back for the metrics endpoint.
    pub fn from_base(
        base: &str,
        push_path: &str,
        metrics_path: &str,
    ) -> Result<Self, TelemetryError> {
        let base = Url::parse(base)?;
        let (push_scheme, pull_scheme) = match base.scheme() {
            "http" | "ws" => ("ws", "http"),
            "https" | "wss" => ("wss", "https"),
            other => {
                return Err(TelemetryError::Settings(format!(
                    "unsupported server scheme '{}' (expected http or https)",
                    other
                )))
            }
        };

        let push = with_scheme(base.join(push_path)?, push_scheme)?;
        let metrics = with_scheme(base.join(metrics_path)?, pull_scheme)?;

        Ok(Self { push, metrics })
    }
}

fn with_scheme(mut url: Url, scheme: &str) -> Result<Url, TelemetryError> {
    url.set_scheme(scheme).map_err(|_| {
        TelemetryError::Settings(format!("cannot use scheme '{}' for {}", scheme, url))
    })?;
    Ok(url)
}

/// WebSocket connector built on `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: Url,
    description: String,
    connect_timeout: Duration,
}

impl WsConnector {
    pub fn new(url: Url) -> Self {
        let description = format!("ws: {}", url);
        Self {
            url,
            description,
            connect_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Give up on an opening handshake that takes longer than `timeout`.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<FrameStream, TelemetryError> {
        let (stream, _response) =
            tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str()))
                .await
                .map_err(|_| {
                    TelemetryError::Connection(format!(
                        "connect timed out after {:?}",
                        self.connect_timeout
                    ))
                })??;

        let frames = stream.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(Ok(text.to_string())),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => Some(Ok(text)),
                    Err(_) => {
                        debug!(len = bytes.len(), "skipping non-UTF-8 binary frame");
                        None
                    }
                },
                Ok(Message::Close(frame)) => {
                    let reason = frame
                        .map(|f| format!("closed by server ({}): {}", f.code, f.reason))
                        .unwrap_or_else(|| "closed by server".to_string());
                    Some(Err(TelemetryError::Connection(reason)))
                }
                // Ping/pong are answered by tungstenite itself
                Ok(_) => None,
                Err(e) => Some(Err(e.into())),
            })
        });

        Ok(frames.boxed())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_base_maps_to_ws() {
        let endpoints = Endpoints::from_base("http://127.0.0.1:8000", "/ws", "/api/metrics").unwrap();
        assert_eq!(endpoints.push.as_str(), "ws://127.0.0.1:8000/ws");
        assert_eq!(endpoints.metrics.as_str(), "http://127.0.0.1:8000/api/metrics");
    }

    #[test]
    fn test_https_base_maps_to_wss() {
        let endpoints =
            Endpoints::from_base("https://dashboard.example.com/", "/ws", "/api/metrics").unwrap();
        assert_eq!(endpoints.push.as_str(), "wss://dashboard.example.com/ws");
        assert_eq!(endpoints.metrics.as_str(), "https://dashboard.example.com/api/metrics");
    }

    #[test]
    fn test_absolute_paths_replace_base_path() {
        let endpoints =
            Endpoints::from_base("http://host:9000/dashboard", "/ws", "/api/metrics").unwrap();
        assert_eq!(endpoints.push.as_str(), "ws://host:9000/ws");
        assert_eq!(endpoints.metrics.as_str(), "http://host:9000/api/metrics");
    }

    #[test]
    fn test_ws_base_is_accepted() {
        let endpoints = Endpoints::from_base("wss://host", "/ws", "/api/metrics").unwrap();
        assert_eq!(endpoints.push.scheme(), "wss");
        assert_eq!(endpoints.metrics.scheme(), "https");
    }

    #[test]
    fn test_rejects_bad_base() {
        assert!(matches!(
            Endpoints::from_base("ftp://host", "/ws", "/api/metrics"),
            Err(TelemetryError::Settings(_))
        ));
        assert!(Endpoints::from_base("not a url", "/ws", "/api/metrics").is_err());
    }

    #[test]
    fn test_ws_connector_description() {
        let connector = WsConnector::new(Url::parse("ws://localhost:8000/ws").unwrap());
        assert_eq!(connector.description(), "ws: ws://localhost:8000/ws");
        assert_eq!(connector.url().path(), "/ws");
    }

    #[tokio::test]
    async fn test_connect_gives_up_on_silent_server() {
        // Accepts TCP but never answers the handshake
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("ws://{}/ws", listener.local_addr().unwrap())).unwrap();
        let connector = WsConnector::new(url).connect_timeout(Duration::from_millis(100));

        let started = std::time::Instant::now();
        let err = match connector.connect().await {
            Ok(_) => panic!("handshake should not complete"),
            Err(err) => err,
        };
        assert!(matches!(err, TelemetryError::Connection(ref msg) if msg.contains("timed out")));
        assert!(started.elapsed() < Duration::from_secs(2));
        drop(listener);
    }
}
