use std::time::{Duration, Instant};

use crate::sink::{Dashboard, DashboardFeed};
use crate::source::ConnectionState;
use crate::ui::theme::Theme;

/// How long a status message stays in the status bar.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    /// While paused the charts and lists stay frozen; the core keeps running.
    pub paused: bool,

    feed: DashboardFeed,
    /// What is on screen.
    pub dashboard: Dashboard,
    pub last_update: Option<Instant>,
    pub core_stopped: bool,

    /// Push endpoint, shown in the header.
    pub endpoint: String,
    pub retry_delay: Duration,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App reading from `feed`.
    pub fn new(feed: DashboardFeed, endpoint: impl Into<String>, retry_delay: Duration) -> Self {
        Self::with_theme(feed, endpoint, retry_delay, Theme::auto_detect())
    }

    pub fn with_theme(
        feed: DashboardFeed,
        endpoint: impl Into<String>,
        retry_delay: Duration,
        theme: Theme,
    ) -> Self {
        Self {
            running: true,
            show_help: false,
            paused: false,
            dashboard: feed.dashboard().clone(),
            feed,
            last_update: None,
            core_stopped: false,
            endpoint: endpoint.into(),
            retry_delay,
            theme,
            status_message: None,
        }
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Connection state, live even while paused.
    pub fn connection(&self) -> ConnectionState {
        self.feed.dashboard().connection
    }

    /// Pull whatever the core published since the last call.
    ///
    /// Returns `true` if the screen should change.
    pub fn refresh(&mut self) -> bool {
        if !self.core_stopped && self.feed.is_closed() {
            self.core_stopped = true;
            self.set_status_message("Client core stopped".to_string());
        }

        if !self.feed.poll() {
            return false;
        }
        self.last_update = Some(Instant::now());
        if !self.paused {
            self.dashboard = self.feed.dashboard().clone();
        }
        true
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        if self.paused {
            self.set_status_message("Paused, press p to resume".to_string());
        } else {
            self.dashboard = self.feed.dashboard().clone();
            self.set_status_message("Resumed".to_string());
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::data::WindowSnapshot;
    use crate::sink::{DisplaySink, WatchSink};

    fn app() -> (App, WatchSink) {
        let (sink, feed) = WatchSink::create();
        let app = App::with_theme(feed, "ws://localhost:8000/ws", Duration::from_secs(3), Theme::dark());
        (app, sink)
    }

    fn one_sample(value: f64) -> WindowSnapshot {
        WindowSnapshot {
            labels: vec!["Genetic".to_string()],
            timestamps: vec![Utc::now()],
            series: vec![vec![Some(value)]],
        }
    }

    #[test]
    fn test_refresh_picks_up_new_frames() {
        let (mut app, sink) = app();
        assert!(!app.refresh());
        assert!(app.last_update.is_none());

        sink.render_samples(one_sample(1.0));
        assert!(app.refresh());
        assert_eq!(app.dashboard.window.series, vec![vec![Some(1.0)]]);
        assert!(app.last_update.is_some());
    }

    #[test]
    fn test_pause_freezes_screen() {
        let (mut app, sink) = app();
        app.toggle_pause();
        assert!(app.paused);

        sink.render_samples(one_sample(2.0));
        assert!(app.refresh());
        assert!(app.dashboard.window.is_empty());

        app.toggle_pause();
        assert_eq!(app.dashboard.window.series, vec![vec![Some(2.0)]]);
        assert_eq!(app.get_status_message(), Some("Resumed"));
    }

    #[test]
    fn test_closed_core_is_reported() {
        let (mut app, sink) = app();
        drop(sink);
        app.refresh();
        assert!(app.core_stopped);
        assert_eq!(app.get_status_message(), Some("Client core stopped"));
    }

    #[test]
    fn test_quit_and_help() {
        let (mut app, _sink) = app();
        app.toggle_help();
        assert!(app.show_help);
        app.quit();
        assert!(!app.running);
    }
}
