//! Summary tiles for the aggregate counters.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

/// Render the three counter tiles.
pub fn render_tiles(frame: &mut Frame, app: &App, area: Rect) {
    let summary = &app.dashboard.summary;
    let tiles = [
        ("Processed", summary.processed.as_str(), app.theme.highlight),
        ("Errors", summary.errors.as_str(), app.theme.critical),
        ("Avg alert latency (ms)", summary.alert_latency.as_str(), app.theme.warning),
    ];

    let chunks = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(area);
    for ((title, value, color), chunk) in tiles.into_iter().zip(chunks.iter()) {
        let block = Block::default()
            .title(Span::styled(format!(" {} ", title), app.theme.header))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));
        let paragraph = Paragraph::new(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(paragraph, *chunk);
    }
}

/// Render the per-stream breakdown line under the tiles.
pub fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let details = &app.dashboard.summary.details;
    let line = if details.is_empty() {
        Line::from(Span::styled(
            " No per-stream breakdown reported",
            Style::default().add_modifier(Modifier::DIM),
        ))
    } else {
        Line::from(format!(" {}", details.join(" · ")))
    };
    frame.render_widget(Paragraph::new(line), area);
}
