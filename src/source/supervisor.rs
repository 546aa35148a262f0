//! Connection supervisor for the push channel.
//!
//! ```text
//!            connect()              frame stream ends / errors
//! Disconnected ──▶ Connecting ──▶ Connected ──────────────┐
//!      ▲               │ refused                          │
//!      └───────────────┴──── wait retry_delay ◀───────────┘
//! ```
//!
//! There is never more than one connection open. After any close or error
//! the supervisor waits a fixed delay and tries again, forever, until the
//! stop signal fires.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::connector::Connector;
use super::router::Router;
use super::{is_stopped, stop_requested};
use crate::data::duration::format_duration;

/// Wait between a close and the next connection attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(3000);

/// Push-channel connection state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Keeps exactly one push connection alive and feeds its frames to the
/// router.
pub struct Supervisor<C> {
    connector: C,
    retry_delay: Duration,
    state: watch::Sender<ConnectionState>,
    attempts: u64,
}

impl<C: Connector> Supervisor<C> {
    pub fn new(connector: C, retry_delay: Duration) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            connector,
            retry_delay,
            state,
            attempts: 0,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Read-only view of the connection state, for the dashboard.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Connection attempts made so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    fn transition(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = %previous, to = %next, "connection state changed");
        }
    }

    /// Run until `stop` fires (or its sender is dropped).
    ///
    /// Every text frame is handed to `router`. Frames that fail to decode
    /// are logged and skipped; they never close the connection.
    pub async fn run(&mut self, router: &mut Router, mut stop: watch::Receiver<bool>) {
        info!(
            endpoint = self.connector.description(),
            retry = %format_duration(self.retry_delay),
            "supervisor started"
        );

        while !is_stopped(&stop) {
            self.transition(ConnectionState::Connecting);
            self.attempts += 1;

            let connected = tokio::select! {
                result = self.connector.connect() => result,
                _ = stop_requested(&mut stop) => break,
            };

            match connected {
                Ok(mut frames) => {
                    self.transition(ConnectionState::Connected);
                    info!(attempt = self.attempts, "push channel connected");

                    let reason = loop {
                        tokio::select! {
                            frame = frames.next() => match frame {
                                Some(Ok(text)) => {
                                    if let Err(e) = router.route(&text) {
                                        warn!(error = %e, "skipping undecodable frame");
                                    }
                                }
                                Some(Err(e)) => break e.to_string(),
                                None => break "stream ended".to_string(),
                            },
                            _ = stop_requested(&mut stop) => {
                                self.transition(ConnectionState::Disconnected);
                                info!("supervisor stopped");
                                return;
                            }
                        }
                    };

                    self.transition(ConnectionState::Disconnected);
                    warn!(
                        %reason,
                        retry = %format_duration(self.retry_delay),
                        "push channel closed, reconnecting"
                    );
                }
                Err(e) => {
                    self.transition(ConnectionState::Disconnected);
                    warn!(
                        error = %e,
                        attempt = self.attempts,
                        retry = %format_duration(self.retry_delay),
                        "push channel connect failed"
                    );
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.retry_delay) => {}
                _ = stop_requested(&mut stop) => break,
            }
        }

        self.transition(ConnectionState::Disconnected);
        info!("supervisor stopped");
    }
}

impl<C> std::fmt::Debug for Supervisor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("retry_delay", &self.retry_delay)
            .field("state", &*self.state.borrow())
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use futures_util::stream;
    use tokio::sync::mpsc;

    use super::*;
    use crate::data::{AlertFeed, ChannelSet, TimeWindow};
    use crate::error::TelemetryError;
    use crate::sink::testing::RecordingSink;
    use crate::source::connector::FrameStream;

    type FrameSender = mpsc::UnboundedSender<Result<String, TelemetryError>>;

    enum Script {
        Refuse,
        Open(mpsc::UnboundedReceiver<Result<String, TelemetryError>>),
    }

    /// Plays back a fixed sequence of connection outcomes. Once the script
    /// runs out, connections open and stay silent.
    struct ScriptedConnector {
        attempts: Arc<AtomicUsize>,
        script: Mutex<VecDeque<Script>>,
    }

    impl ScriptedConnector {
        fn new(script: Vec<Script>) -> (Self, Arc<AtomicUsize>) {
            let attempts = Arc::new(AtomicUsize::new(0));
            let connector = Self {
                attempts: attempts.clone(),
                script: Mutex::new(script.into()),
            };
            (connector, attempts)
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        async fn connect(&self) -> Result<FrameStream, TelemetryError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Script::Refuse) => Err(TelemetryError::Connection("refused".to_string())),
                Some(Script::Open(rx)) => Ok(stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|frame| (frame, rx))
                })
                .boxed()),
                None => Ok(stream::pending().boxed()),
            }
        }

        fn description(&self) -> &str {
            "scripted"
        }
    }

    fn open() -> (Script, FrameSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Script::Open(rx), tx)
    }

    fn router() -> (Router, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let router = Router::new(
            TimeWindow::new(ChannelSet::default(), 50),
            AlertFeed::default(),
            sink.clone(),
        );
        (router, sink)
    }

    fn start(
        connector: ScriptedConnector,
    ) -> (
        watch::Sender<bool>,
        watch::Receiver<ConnectionState>,
        Arc<RecordingSink>,
        tokio::task::JoinHandle<(Supervisor<ScriptedConnector>, Router)>,
    ) {
        let mut supervisor = Supervisor::new(connector, DEFAULT_RETRY_DELAY);
        let state = supervisor.subscribe();
        let (mut router, sink) = router();
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            supervisor.run(&mut router, stop_rx).await;
            (supervisor, router)
        });
        (stop_tx, state, sink, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_reconnect_after_retry_delay() {
        let (connector, attempts) = ScriptedConnector::new(vec![Script::Refuse]);
        let (stop, state, _sink, handle) = start(connector);

        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(*state.borrow(), ConnectionState::Disconnected);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(*state.borrow(), ConnectionState::Connected);

        // The second connection stays open, so no further attempts
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        stop.send(true).unwrap();
        let (supervisor, _router) = handle.await.unwrap();
        assert_eq!(supervisor.attempts(), 2);
        assert_eq!(supervisor.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_stream_triggers_reconnect() {
        let (script, tx) = open();
        let (connector, attempts) = ScriptedConnector::new(vec![script]);
        let (stop, state, _sink, handle) = start(connector);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*state.borrow(), ConnectionState::Connected);

        tx.send(Err(TelemetryError::Connection("closed by server".to_string())))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*state.borrow(), ConnectionState::Disconnected);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(*state.borrow(), ConnectionState::Connected);

        stop.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_retry_delay() {
        let (connector, attempts) = ScriptedConnector::new(vec![Script::Refuse]);
        let (stop, state, _sink, handle) = start(connector);

        tokio::time::sleep(Duration::from_millis(100)).await;
        stop.send(true).unwrap();

        let finished = tokio::time::timeout(Duration::from_millis(10), handle).await;
        assert!(finished.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(*state.borrow(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_stop_sender_stops() {
        let (connector, _attempts) = ScriptedConnector::new(vec![]);
        let (stop, _state, _sink, handle) = start(connector);

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(stop);

        let finished = tokio::time::timeout(Duration::from_millis(10), handle).await;
        assert!(finished.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_failure_keeps_connection() {
        let (script, tx) = open();
        let (connector, attempts) = ScriptedConnector::new(vec![script]);
        let (stop, state, sink, handle) = start(connector);

        tx.send(Ok(r#"{"type":"latency","label":"Genetic","value":5.0}"#.to_string()))
            .unwrap();
        tx.send(Ok("{not json".to_string())).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(*state.borrow(), ConnectionState::Connected);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(sink.sample_renders(), 1);
        assert_eq!(sink.stats.lock().unwrap().last().unwrap().decode_failures, 1);

        stop.send(true).unwrap();
        let (_supervisor, router) = handle.await.unwrap();
        assert_eq!(router.window().len(), 1);
        assert_eq!(router.window().values("Genetic").unwrap()[0], Some(5.0));
    }
}
