//! Alert feed panel, newest first.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let alerts = &app.dashboard.alerts;
    let block = Block::default()
        .title(Span::styled(format!(" Alerts ({}) ", alerts.len()), app.theme.header))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if alerts.is_empty() {
        let paragraph = Paragraph::new(Span::styled(
            " No alerts yet",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = alerts
        .iter()
        .map(|alert| {
            let style = app.theme.severity_style(&alert.level_class());
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<8} ", alert.level), style),
                Span::raw(alert.display_line()),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
