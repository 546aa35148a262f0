//! The client core: everything that talks to the backend.
//!
//! Two independent loops share one stop signal:
//!
//! - the [`Supervisor`] keeps a push connection open and hands every frame to
//!   the [`Router`], which owns the time window and the alert feed
//! - the [`Poller`] pulls aggregate metrics on a fixed interval
//!
//! Neither loop blocks the other, and both publish through a
//! [`DisplaySink`](crate::sink::DisplaySink).

mod connector;
mod message;
mod poller;
mod router;
mod supervisor;

pub use connector::{Connector, Endpoints, FrameStream, WsConnector};
pub use message::{AlertNotice, Inbound, LatencySample};
pub use poller::{
    parse_metrics, Fetcher, HttpFetcher, HttpFetcherBuilder, Poller, DEFAULT_POLL_INTERVAL,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use router::{Router, RouterStats, RoutingOutcome};
pub use supervisor::{ConnectionState, Supervisor, DEFAULT_RETRY_DELAY};

use tokio::sync::watch;

/// True once stop was requested or the stop sender is gone.
pub(crate) fn is_stopped(stop: &watch::Receiver<bool>) -> bool {
    *stop.borrow() || stop.has_changed().is_err()
}

/// Resolves once stop is requested or the stop sender is dropped.
pub(crate) async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    // An Err here means the sender was dropped, which also means stop
    let _ = stop.wait_for(|stopped| *stopped).await;
}
