//! Message router: turns push-channel frames into window and feed updates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::message::{AlertNotice, Inbound, LatencySample};
use crate::data::{AlertFeed, TimeWindow};
use crate::error::TelemetryError;
use crate::sink::DisplaySink;

/// What the router did with one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingOutcome {
    /// A sample was recorded in the time window.
    Sample { channel: String, value: Option<f64> },
    /// An alert was added to the feed.
    Alert { level: String },
    /// The frame's type is not one the router handles.
    Ignored { kind: Option<String> },
    /// A recognized frame that could not be applied (missing field,
    /// unknown channel).
    Dropped { reason: String },
}

/// Running counters, shown in the dashboard status bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub samples: u64,
    pub alerts: u64,
    pub ignored: u64,
    pub dropped: u64,
    pub decode_failures: u64,
}

/// Owns the time window and the alert feed and applies decoded frames to
/// them.
///
/// Nothing else mutates the window or the feed. After every mutation the
/// router pushes a fresh snapshot to the display sink.
pub struct Router {
    window: TimeWindow,
    feed: AlertFeed,
    sink: Arc<dyn DisplaySink>,
    stats: RouterStats,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("window", &self.window)
            .field("feed", &self.feed)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Router {
    pub fn new(window: TimeWindow, feed: AlertFeed, sink: Arc<dyn DisplaySink>) -> Self {
        Self {
            window,
            feed,
            sink,
            stats: RouterStats::default(),
        }
    }

    /// Decode and apply one raw frame, stamped with the current time.
    ///
    /// Fails only when the frame is not JSON at all; in that case nothing
    /// is mutated. Unknown or incomplete frames are reported through the
    /// returned [`RoutingOutcome`] instead.
    pub fn route(&mut self, raw: &str) -> Result<RoutingOutcome, TelemetryError> {
        match Inbound::decode(raw) {
            Ok(inbound) => Ok(self.dispatch(inbound, Utc::now())),
            Err(e) => {
                self.stats.decode_failures += 1;
                self.sink.render_stats(self.stats);
                Err(e)
            }
        }
    }

    /// Apply an already decoded frame as if it arrived at `now`.
    pub fn dispatch(&mut self, inbound: Inbound, now: DateTime<Utc>) -> RoutingOutcome {
        let outcome = match inbound {
            Inbound::Latency(sample) => self.record_sample(sample, now),
            Inbound::Alert(notice) => self.push_alert(notice, now),
            Inbound::Unknown(kind) => {
                debug!(kind = ?kind, "ignoring message of unhandled type");
                self.stats.ignored += 1;
                RoutingOutcome::Ignored { kind }
            }
            Inbound::Incomplete { kind, reason } => {
                warn!(kind, %reason, "dropping incomplete message");
                self.stats.dropped += 1;
                RoutingOutcome::Dropped {
                    reason: format!("{} message: {}", kind, reason),
                }
            }
        };
        self.sink.render_stats(self.stats);
        outcome
    }

    fn record_sample(&mut self, sample: LatencySample, now: DateTime<Utc>) -> RoutingOutcome {
        match self.window.record(&sample.label, sample.value, now) {
            Ok(slot) => {
                self.stats.samples += 1;
                self.sink.render_samples(self.window.snapshot());
                let channel = self.window.channels().label(slot).unwrap_or(sample.label.as_str());
                RoutingOutcome::Sample {
                    channel: channel.to_string(),
                    value: sample.value,
                }
            }
            Err(e) => {
                warn!(channel = %sample.label, "dropping sample: {}", e);
                self.stats.dropped += 1;
                RoutingOutcome::Dropped {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn push_alert(&mut self, notice: AlertNotice, now: DateTime<Utc>) -> RoutingOutcome {
        let level = notice.level.clone();
        self.feed.push(notice.message, notice.level, now);
        self.stats.alerts += 1;
        self.sink.render_alerts(self.feed.snapshot());
        RoutingOutcome::Alert { level }
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn feed(&self) -> &AlertFeed {
        &self.feed
    }

    pub fn stats(&self) -> RouterStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ChannelSet;
    use crate::sink::testing::RecordingSink;

    fn router() -> (Router, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let router = Router::new(
            TimeWindow::new(ChannelSet::default(), 50),
            AlertFeed::default(),
            sink.clone(),
        );
        (router, sink)
    }

    fn latency(label: &str, value: f64) -> String {
        format!(r#"{{"type":"latency","label":"{}","value":{}}}"#, label, value)
    }

    #[test]
    fn test_latency_goes_to_window() {
        let (mut router, sink) = router();
        let outcome = router.route(&latency("genetic", 12.5)).unwrap();

        assert_eq!(
            outcome,
            RoutingOutcome::Sample {
                channel: "Genetic".to_string(),
                value: Some(12.5),
            }
        );
        assert_eq!(router.window().len(), 1);
        assert_eq!(router.window().values("Genetic").unwrap()[0], Some(12.5));
        assert_eq!(sink.sample_renders(), 1);
        assert_eq!(sink.alert_renders(), 0);
    }

    #[test]
    fn test_alert_goes_to_feed() {
        let (mut router, sink) = router();
        let outcome = router
            .route(r#"{"type":"alert","message":"Evento crítico detectado","level":"CRITICAL"}"#)
            .unwrap();

        assert_eq!(
            outcome,
            RoutingOutcome::Alert {
                level: "CRITICAL".to_string()
            }
        );
        assert_eq!(router.feed().latest().unwrap().message, "Evento crítico detectado");
        assert_eq!(sink.alert_renders(), 1);
        assert!(router.window().is_empty());
    }

    #[test]
    fn test_malformed_frame_changes_nothing() {
        let (mut router, sink) = router();
        router.route(&latency("Genetic", 1.0)).unwrap();
        let before = router.window().snapshot();

        let err = router.route("{\"type\":\"latency\"").unwrap_err();
        assert!(matches!(err, TelemetryError::Decode(_)));
        assert_eq!(router.window().snapshot(), before);
        assert!(router.feed().is_empty());
        assert_eq!(sink.sample_renders(), 1);
        assert_eq!(router.stats().decode_failures, 1);
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        let (mut router, sink) = router();
        let outcome = router.route(r#"{"type":"heartbeat"}"#).unwrap();

        assert_eq!(
            outcome,
            RoutingOutcome::Ignored {
                kind: Some("heartbeat".to_string())
            }
        );
        assert_eq!(router.stats().ignored, 1);
        assert_eq!(sink.sample_renders(), 0);
        assert_eq!(sink.alert_renders(), 0);
    }

    #[test]
    fn test_incomplete_and_unknown_channel_are_dropped() {
        let (mut router, _sink) = router();

        let missing = router.route(r#"{"type":"alert","level":"INFO"}"#).unwrap();
        assert!(matches!(missing, RoutingOutcome::Dropped { .. }));

        let unknown = router.route(&latency("Thermal", 3.0)).unwrap();
        assert!(matches!(unknown, RoutingOutcome::Dropped { ref reason } if reason.contains("Thermal")));

        assert_eq!(router.stats().dropped, 2);
        assert!(router.window().is_empty());
        assert!(router.feed().is_empty());
    }

    #[test]
    fn test_fifty_one_samples_keep_last_fifty() {
        let (mut router, _sink) = router();
        for i in 0..51 {
            router.route(&latency("Physical", i as f64)).unwrap();
        }

        let physical: Vec<_> = router.window().values("physical").unwrap().iter().copied().collect();
        let expected: Vec<_> = (1..51).map(|i| Some(i as f64)).collect();
        assert_eq!(physical, expected);
        assert_eq!(router.stats().samples, 51);
    }

    #[test]
    fn test_stats_are_published() {
        let (mut router, sink) = router();
        router.route(&latency("Genetic", 1.0)).unwrap();
        router.route(r#"{"type":"other"}"#).unwrap();

        let stats = sink.stats.lock().unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[1].samples, 1);
        assert_eq!(stats[1].ignored, 1);
    }
}
