//! Aggregate poller: pulls the backend's metrics summary on a fixed interval.
//!
//! Each tick starts one `GET` and tags it with a sequence number. Responses
//! are applied last-writer-wins, so a slow response from an older tick is
//! dropped rather than overwriting a newer one. A failed pull is logged and
//! skipped; the previous summary stays on screen and the ticker keeps going.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use url::Url;

use super::stop_requested;
use crate::data::duration::format_duration;
use crate::data::{AggregateSnapshot, SummaryState};
use crate::error::TelemetryError;
use crate::sink::DisplaySink;

/// Time between two metrics pulls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Per-request timeout for a metrics pull.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of aggregate snapshots.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self) -> Result<AggregateSnapshot, TelemetryError>;
}

/// [`Fetcher`] for the backend's `GET /api/metrics` endpoint.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    url: Url,
}

impl HttpFetcher {
    /// Create a new builder for the given metrics URL.
    pub fn builder(url: Url) -> HttpFetcherBuilder {
        HttpFetcherBuilder { url, timeout: None }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> Result<AggregateSnapshot, TelemetryError> {
        let response = self.client.get(self.url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(TelemetryError::Fetch(format!(
                "endpoint returned status {}",
                response.status()
            )));
        }

        let metrics: MetricsResponse = response
            .json()
            .await
            .map_err(|e| TelemetryError::Fetch(format!("unexpected response body: {}", e)))?;
        Ok(metrics.into())
    }
}

/// Builder for [`HttpFetcher`].
#[derive(Debug)]
pub struct HttpFetcherBuilder {
    url: Url,
    timeout: Option<Duration>,
}

impl HttpFetcherBuilder {
    /// Set the request timeout (default: 5 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpFetcher, TelemetryError> {
        let timeout = self.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpFetcher {
            client,
            url: self.url,
        })
    }
}

/// Parse a metrics response body.
///
/// ```
/// let snapshot = pulseboard::source::parse_metrics(
///     r#"{"events_processed":{"total":42},"errors_count":{"total":3},"average_alert_latency_ms":12.345}"#,
/// ).unwrap();
/// assert_eq!(snapshot.total_processed, 42);
/// ```
pub fn parse_metrics(body: &str) -> Result<AggregateSnapshot, TelemetryError> {
    let response: MetricsResponse = serde_json::from_str(body)
        .map_err(|e| TelemetryError::Fetch(format!("unexpected response body: {}", e)))?;
    Ok(response.into())
}

/// Body of `GET /api/metrics`.
#[derive(Debug, Deserialize)]
struct MetricsResponse {
    events_processed: CounterGroup,
    errors_count: CounterGroup,
    average_alert_latency_ms: f64,
    #[serde(default)]
    average_processing_latency_ms: BTreeMap<String, Value>,
}

/// A `{"total": n, "<name>": n, ...}` counter object.
#[derive(Debug, Deserialize)]
struct CounterGroup {
    total: u64,
    #[serde(flatten)]
    breakdown: BTreeMap<String, Value>,
}

impl CounterGroup {
    fn counts(self) -> BTreeMap<String, u64> {
        self.breakdown
            .into_iter()
            .filter_map(|(name, value)| value.as_u64().map(|count| (name, count)))
            .collect()
    }
}

impl From<MetricsResponse> for AggregateSnapshot {
    fn from(response: MetricsResponse) -> Self {
        let total_processed = response.events_processed.total;
        let total_errors = response.errors_count.total;

        AggregateSnapshot {
            total_processed,
            total_errors,
            average_alert_latency_ms: response.average_alert_latency_ms,
            processed_by_stream: response.events_processed.counts(),
            errors_by_kind: response.errors_count.counts(),
            processing_latency_ms: response
                .average_processing_latency_ms
                .into_iter()
                .filter_map(|(name, value)| value.as_f64().map(|ms| (name, ms)))
                .collect(),
        }
    }
}

/// A finished pull, tagged with its sequence number.
type PullResult = (u64, Result<AggregateSnapshot, TelemetryError>);

/// Pulls aggregate snapshots on a fixed interval and publishes their
/// display strings.
pub struct Poller<F> {
    fetcher: Arc<F>,
    interval: Duration,
    sink: Arc<dyn DisplaySink>,
    state: SummaryState,
    next_seq: u64,
}

impl<F: Fetcher + 'static> Poller<F> {
    pub fn new(fetcher: F, interval: Duration, sink: Arc<dyn DisplaySink>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            // tokio's interval rejects a zero period
            interval: interval.max(Duration::from_millis(1)),
            sink,
            state: SummaryState::new(),
            next_seq: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The latest applied snapshot, if any pull has succeeded.
    pub fn current(&self) -> Option<&AggregateSnapshot> {
        self.state.current()
    }

    fn next_sequence(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Apply the result of pull number `seq`.
    ///
    /// Returns whether the display was updated.
    pub fn apply(&mut self, seq: u64, result: Result<AggregateSnapshot, TelemetryError>) -> bool {
        match result {
            Ok(snapshot) => {
                if !self.state.apply(seq, snapshot) {
                    debug!(seq, "discarding stale metrics response");
                    return false;
                }
                let summary = self.state.display();
                debug!(
                    seq,
                    processed = %summary.processed,
                    errors = %summary.errors,
                    "metrics updated"
                );
                self.sink.render_summary(summary);
                true
            }
            Err(e) => {
                warn!(seq, error = %e, "metrics pull failed, keeping previous summary");
                false
            }
        }
    }

    /// Run a single pull and apply it.
    pub async fn poll_once(&mut self) -> bool {
        let seq = self.next_sequence();
        let result = self.fetcher.fetch().await;
        self.apply(seq, result)
    }

    /// Pull every interval until `stop` fires. The first pull is immediate.
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) {
        info!(interval = %format_duration(self.interval), "poller started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: FuturesUnordered<BoxFuture<'static, PullResult>> = FuturesUnordered::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let seq = self.next_sequence();
                    let fetcher = self.fetcher.clone();
                    in_flight.push(async move { (seq, fetcher.fetch().await) }.boxed());
                }
                Some((seq, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    self.apply(seq, result);
                }
                _ = stop_requested(&mut stop) => break,
            }
        }

        info!(abandoned = in_flight.len(), "poller stopped");
    }
}

impl<F> std::fmt::Debug for Poller<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("interval", &self.interval)
            .field("state", &self.state)
            .field("next_seq", &self.next_seq)
            .finish_non_exhaustive()
    }
}
