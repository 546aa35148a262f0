// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # pulseboard
//!
//! A live telemetry dashboard client for the terminal.
//!
//! The client keeps one WebSocket push connection open to a telemetry
//! backend, plots the latency samples it receives on a sliding time window,
//! lists the alerts it receives newest first, and pulls aggregate counters
//! from the backend's HTTP metrics endpoint every two seconds.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────── core thread (tokio) ────────────────────┐
//! │                                                             │
//! │  Supervisor ──frames──▶ Router ──┬──▶ TimeWindow            │
//! │  (reconnect every 3s)            └──▶ AlertFeed             │
//! │                                        │                    │
//! │  Poller ──GET /api/metrics──▶ SummaryState                  │
//! │                                        │                    │
//! └────────────────────────────────────────┼────────────────────┘
//!                                          ▼
//!                               DisplaySink (WatchSink)
//!                                          │
//! ┌──────────────── main thread ───────────┼────────────────────┐
//! │                    DashboardFeed ◀─────┘                    │
//! │  app (state) ──▶ ui (ratatui) ──▶ Terminal                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`data`]**: The time window, the alert feed and the aggregate counters
//! - **[`source`]**: The client core: message decoding, routing, the connection
//!   supervisor and the metrics poller
//! - **[`sink`]**: The [`DisplaySink`] trait and its watch-channel implementation
//! - **[`session`]**: Runs the core on its own thread
//! - **[`app`]**, **[`ui`]**: The terminal dashboard
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Connect to a local backend
//! pulseboard --server http://127.0.0.1:8000
//!
//! # Print the aggregate counters once and exit
//! pulseboard --server https://telemetry.example.com --once
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use pulseboard::{AlertFeed, ChannelSet, DisplaySink, Router, TimeWindow, WatchSink};
//!
//! let (sink, mut feed) = WatchSink::create();
//! let mut router = Router::new(
//!     TimeWindow::new(ChannelSet::default(), 50),
//!     AlertFeed::default(),
//!     Arc::new(sink),
//! );
//!
//! router.route(r#"{"type":"latency","label":"genetic","value":2003.4}"#).unwrap();
//! assert!(feed.poll());
//! assert_eq!(feed.dashboard().window.len(), 1);
//! ```
//!
//! ### Running a session
//!
//! ```no_run
//! use std::sync::Arc;
//! use pulseboard::{Session, Settings, WatchSink};
//!
//! let (sink, mut feed) = WatchSink::create();
//! let session = Session::new(Settings::default())?;
//! let handle = session.spawn(Arc::new(sink))?;
//! feed.attach_connection(handle.connection());
//!
//! // ... poll `feed` from a UI loop ...
//!
//! handle.shutdown();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Pulling the aggregate counters directly
//!
//! ```no_run
//! use pulseboard::{Fetcher, HttpFetcher, Settings};
//!
//! # tokio_test::block_on(async {
//! let endpoints = Settings::default().endpoints().unwrap();
//! let fetcher = HttpFetcher::builder(endpoints.metrics).build().unwrap();
//! let snapshot = fetcher.fetch().await.unwrap();
//! println!("{} processed, {} errors", snapshot.total_processed, snapshot.total_errors);
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod session;
pub mod sink;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use data::{
    AggregateSnapshot, AlertEvent, AlertFeed, ChannelSet, SummaryDisplay, SummaryState,
    TimeWindow, WindowSnapshot,
};
pub use error::TelemetryError;
pub use session::{Session, SessionHandle};
pub use sink::{Dashboard, DashboardFeed, DisplaySink, WatchSink};
pub use source::{
    ConnectionState, Connector, Endpoints, Fetcher, HttpFetcher, Inbound, Poller, Router,
    RouterStats, RoutingOutcome, Supervisor, WsConnector,
};
