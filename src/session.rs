//! A running client session.
//!
//! The session owns the client core (supervisor, router and poller) and runs
//! it on a dedicated thread with its own single-threaded tokio runtime, so
//! the terminal UI on the main thread never waits on the network. Dropping
//! the [`SessionHandle`] (or calling [`SessionHandle::shutdown`]) stops both
//! loops and closes the push connection.

use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::watch;
use tracing::{error, info};

use crate::config::Settings;
use crate::data::{AlertFeed, ChannelSet, TimeWindow};
use crate::error::TelemetryError;
use crate::sink::DisplaySink;
use crate::source::{
    ConnectionState, Endpoints, HttpFetcher, Poller, Router, Supervisor, WsConnector,
};

const CORE_THREAD: &str = "pulseboard-core";

/// A validated, not yet started session.
#[derive(Debug)]
pub struct Session {
    settings: Settings,
    channels: ChannelSet,
    endpoints: Endpoints,
    fetcher: HttpFetcher,
}

impl Session {
    pub fn new(settings: Settings) -> Result<Self, TelemetryError> {
        settings.validate()?;
        let channels = settings.channel_set()?;
        let endpoints = settings.endpoints()?;
        let fetcher = HttpFetcher::builder(endpoints.metrics.clone())
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            settings,
            channels,
            endpoints,
            fetcher,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Start the core thread, publishing into `sink`.
    pub fn spawn(self, sink: Arc<dyn DisplaySink>) -> std::io::Result<SessionHandle> {
        let Session {
            settings,
            channels,
            endpoints,
            fetcher,
        } = self;

        let mut router = Router::new(
            TimeWindow::new(channels, settings.window_capacity),
            AlertFeed::new(settings.alert_capacity),
            sink.clone(),
        );
        let mut supervisor = Supervisor::new(
            WsConnector::new(endpoints.push.clone()).connect_timeout(settings.request_timeout),
            settings.retry_delay,
        );
        let mut poller = Poller::new(fetcher, settings.poll_interval, sink);
        let connection = supervisor.subscribe();
        let (stop, stop_rx) = watch::channel(false);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let thread = std::thread::Builder::new()
            .name(CORE_THREAD.to_string())
            .spawn(move || {
                runtime.block_on(async {
                    tokio::join!(
                        supervisor.run(&mut router, stop_rx.clone()),
                        poller.run(stop_rx),
                    );
                });
                info!(stats = ?router.stats(), "session ended");
            })?;

        info!(push = %endpoints.push, metrics = %endpoints.metrics, "session started");

        Ok(SessionHandle {
            stop,
            thread: Some(thread),
            connection,
            endpoints,
        })
    }
}

/// Handle to a running session.
#[derive(Debug)]
pub struct SessionHandle {
    stop: watch::Sender<bool>,
    thread: Option<JoinHandle<()>>,
    connection: watch::Receiver<ConnectionState>,
    endpoints: Endpoints,
}

impl SessionHandle {
    /// Read-only view of the push connection state.
    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.clone()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop both loops and wait for the core thread to exit.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.stop.send_replace(true);
        if thread.join().is_err() {
            error!("{} thread panicked", CORE_THREAD);
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
