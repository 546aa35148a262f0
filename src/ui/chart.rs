//! Latency line chart over the time window.

use chrono::Local;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::WindowSnapshot;

/// Headroom above the largest value.
const Y_HEADROOM: f64 = 1.1;

/// Render one line per channel, x = sample index, y = latency.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let window = &app.dashboard.window;
    let block = Block::default()
        .title(Span::styled(" Latency (ms) ", app.theme.header))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if window.is_empty() {
        let paragraph = Paragraph::new(Span::styled(
            " Waiting for samples...",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    // Datasets borrow their points
    let points: Vec<Vec<(f64, f64)>> = (0..window.labels.len()).map(|slot| window.points(slot)).collect();
    let datasets: Vec<Dataset> = window
        .labels
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(slot, (label, data))| {
            Dataset::default()
                .name(label.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(app.theme.series_color(slot)))
                .data(data)
        })
        .collect();

    let x_max = x_upper_bound(window);
    let y_max = y_upper_bound(window);

    let x_axis = Axis::default()
        .style(Style::default().fg(app.theme.border))
        .bounds([0.0, x_max])
        .labels(time_labels(window));
    let y_axis = Axis::default()
        .style(Style::default().fg(app.theme.border))
        .bounds([0.0, y_max])
        .labels(vec![
            "0".to_string(),
            format!("{:.0}", y_max / 2.0),
            format!("{:.0}", y_max),
        ]);

    let chart = Chart::new(datasets).block(block).x_axis(x_axis).y_axis(y_axis);
    frame.render_widget(chart, area);
}

fn x_upper_bound(window: &WindowSnapshot) -> f64 {
    window.len().saturating_sub(1).max(1) as f64
}

fn y_upper_bound(window: &WindowSnapshot) -> f64 {
    match window.max_value() {
        Some(max) if max > 0.0 => max * Y_HEADROOM,
        _ => 1.0,
    }
}

fn time_labels(window: &WindowSnapshot) -> Vec<String> {
    match window.time_span() {
        Some((first, last)) => vec![
            first.with_timezone(&Local).format("%H:%M:%S").to_string(),
            last.with_timezone(&Local).format("%H:%M:%S").to_string(),
        ],
        None => Vec::new(),
    }
}
