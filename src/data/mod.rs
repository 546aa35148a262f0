//! Client-side state: the sample window, the alert feed and the aggregate
//! counters.
//!
//! ## Submodules
//!
//! - [`channel`]: The fixed, case-insensitive set of plotted channels
//! - [`window`]: Sliding window of time-aligned samples ([`TimeWindow`])
//! - [`feed`]: Most-recent-first alert store ([`AlertFeed`])
//! - [`summary`]: Aggregate counters and their display strings
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "3s", "500ms")
//!
//! ## Data Flow
//!
//! ```text
//! push message ──▶ Router ──┬──▶ TimeWindow::record() ──▶ WindowSnapshot
//!                           └──▶ AlertFeed::push()    ──▶ Vec<AlertEvent>
//!
//! metrics pull ──▶ Poller ─────▶ SummaryState::apply() ─▶ SummaryDisplay
//! ```

pub mod channel;
pub mod duration;
pub mod feed;
pub mod summary;
pub mod window;

pub use channel::{ChannelSet, DEFAULT_CHANNELS};
pub use feed::{AlertEvent, AlertFeed, DEFAULT_ALERT_CAPACITY};
pub use summary::{AggregateSnapshot, SummaryDisplay, SummaryState};
pub use window::{TimeWindow, WindowSnapshot, DEFAULT_WINDOW_CAPACITY};
