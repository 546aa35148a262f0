//! Terminal rendering with ratatui.
//!
//! ```text
//! ┌ header: connection state, endpoint ─────────────────────┐
//! │ [Processed]     [Errors]     [Avg alert latency (ms)]   │
//! │ per-stream details                                      │
//! │ ┌ Latency (ms) ─────────────────┐ ┌ Alerts ───────────┐ │
//! │ │ one line per channel          │ │ newest first      │ │
//! │ └───────────────────────────────┘ └───────────────────┘ │
//! └ status bar: router counters, controls ──────────────────┘
//! ```

pub mod alerts;
pub mod chart;
pub mod common;
pub mod summary;
pub mod theme;

use ratatui::{
    layout::{Constraint, Layout},
    Frame,
};

use crate::app::App;

/// Minimum terminal size for usable display.
pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 14;

/// Draw the whole dashboard.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        common::render_too_small(frame, app, area, (MIN_WIDTH, MIN_HEIGHT));
        return;
    }

    let rows = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Length(3), // Summary tiles
        Constraint::Length(1), // Details
        Constraint::Min(8),    // Chart and alerts
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, app, rows[0]);
    summary::render_tiles(frame, app, rows[1]);
    summary::render_details(frame, app, rows[2]);

    let panels = Layout::horizontal([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(rows[3]);
    chart::render(frame, app, panels[0]);
    alerts::render(frame, app, panels[1]);

    common::render_status_bar(frame, app, rows[4]);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}
