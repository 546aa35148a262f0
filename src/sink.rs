//! Display sink: where the client core publishes what should be on screen.
//!
//! The core never draws anything itself. The router hands the sink a fresh
//! window or alert snapshot after every mutation, and the poller hands it
//! new summary strings after every successful pull. [`WatchSink`] backs the
//! sink with `tokio::sync::watch` channels so the terminal UI, running on its
//! own thread, can pick up the latest frame without blocking the core.

use tokio::sync::watch;

use crate::data::{AlertEvent, SummaryDisplay, WindowSnapshot};
use crate::source::{ConnectionState, RouterStats};

/// Receiver of snapshots produced by the client core.
///
/// Every call carries a complete, owned value that replaces whatever the
/// sink showed before, so a reader can never observe half an update.
pub trait DisplaySink: Send + Sync {
    /// A sample was appended to the time window.
    fn render_samples(&self, window: WindowSnapshot);

    /// An alert was added to the feed (newest first).
    fn render_alerts(&self, alerts: Vec<AlertEvent>);

    /// The aggregate counters were refreshed.
    fn render_summary(&self, summary: SummaryDisplay);

    /// Router counters changed.
    fn render_stats(&self, _stats: RouterStats) {}
}

/// Everything the dashboard shows, as of the last [`DashboardFeed::poll`].
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub window: WindowSnapshot,
    pub alerts: Vec<AlertEvent>,
    pub summary: SummaryDisplay,
    pub stats: RouterStats,
    pub connection: ConnectionState,
}

/// A [`DisplaySink`] that publishes into watch channels.
#[derive(Debug)]
pub struct WatchSink {
    window: watch::Sender<WindowSnapshot>,
    alerts: watch::Sender<Vec<AlertEvent>>,
    summary: watch::Sender<SummaryDisplay>,
    stats: watch::Sender<RouterStats>,
}

impl WatchSink {
    /// Create a sink and the feed that reads from it.
    pub fn create() -> (Self, DashboardFeed) {
        let (window_tx, window_rx) = watch::channel(WindowSnapshot::default());
        let (alerts_tx, alerts_rx) = watch::channel(Vec::new());
        let (summary_tx, summary_rx) = watch::channel(SummaryDisplay::default());
        let (stats_tx, stats_rx) = watch::channel(RouterStats::default());

        let sink = Self {
            window: window_tx,
            alerts: alerts_tx,
            summary: summary_tx,
            stats: stats_tx,
        };
        let feed = DashboardFeed {
            window: window_rx,
            alerts: alerts_rx,
            summary: summary_rx,
            stats: stats_rx,
            connection: None,
            current: Dashboard::default(),
        };
        (sink, feed)
    }
}

impl DisplaySink for WatchSink {
    fn render_samples(&self, window: WindowSnapshot) {
        self.window.send_replace(window);
    }

    fn render_alerts(&self, alerts: Vec<AlertEvent>) {
        self.alerts.send_replace(alerts);
    }

    fn render_summary(&self, summary: SummaryDisplay) {
        self.summary.send_replace(summary);
    }

    fn render_stats(&self, stats: RouterStats) {
        self.stats.send_replace(stats);
    }
}

/// Non-blocking reader for a [`WatchSink`].
#[derive(Debug)]
pub struct DashboardFeed {
    window: watch::Receiver<WindowSnapshot>,
    alerts: watch::Receiver<Vec<AlertEvent>>,
    summary: watch::Receiver<SummaryDisplay>,
    stats: watch::Receiver<RouterStats>,
    connection: Option<watch::Receiver<ConnectionState>>,
    current: Dashboard,
}

impl DashboardFeed {
    /// Also track the supervisor's connection state.
    pub fn attach_connection(&mut self, connection: watch::Receiver<ConnectionState>) {
        self.current.connection = *connection.borrow();
        self.connection = Some(connection);
    }

    /// Pull in whatever changed since the last poll.
    ///
    /// Returns `true` if anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;

        if self.window.has_changed().unwrap_or(false) {
            self.current.window = self.window.borrow_and_update().clone();
            changed = true;
        }
        if self.alerts.has_changed().unwrap_or(false) {
            self.current.alerts = self.alerts.borrow_and_update().clone();
            changed = true;
        }
        if self.summary.has_changed().unwrap_or(false) {
            self.current.summary = self.summary.borrow_and_update().clone();
            changed = true;
        }
        if self.stats.has_changed().unwrap_or(false) {
            self.current.stats = *self.stats.borrow_and_update();
            changed = true;
        }
        if let Some(connection) = self.connection.as_mut() {
            if connection.has_changed().unwrap_or(false) {
                self.current.connection = *connection.borrow_and_update();
                changed = true;
            }
        }

        changed
    }

    /// The dashboard as of the last poll.
    pub fn dashboard(&self) -> &Dashboard {
        &self.current
    }

    /// True once the sink has been dropped (the core has shut down).
    pub fn is_closed(&self) -> bool {
        self.window.has_changed().is_err()
    }
}
