//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::source::ConnectionState;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for warning-level alerts and a reconnecting channel.
    pub warning: Color,
    /// Color for critical-level alerts and a lost connection.
    pub critical: Color,
    /// Color for a live connection.
    pub healthy: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for block titles and tile labels.
    pub header: Style,
    /// Line colors for plotted channels, cycled by slot.
    pub series: [Color; 3],
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            series: [Color::LightRed, Color::LightBlue, Color::LightGreen],
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            series: [Color::Red, Color::Blue, Color::Green],
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Line color for the channel in `slot`.
    pub fn series_color(&self, slot: usize) -> Color {
        self.series[slot % self.series.len()]
    }

    /// Style for an alert severity class (`critical`, `warning`, ...).
    pub fn severity_style(&self, class: &str) -> Style {
        match class {
            "critical" | "error" => Style::default().fg(self.critical).add_modifier(Modifier::BOLD),
            "warning" | "warn" => Style::default().fg(self.warning),
            "info" => Style::default().fg(self.highlight),
            _ => Style::default(),
        }
    }

    /// Style for the connection indicator.
    pub fn connection_style(&self, state: ConnectionState) -> Style {
        match state {
            ConnectionState::Connected => Style::default().fg(self.healthy),
            ConnectionState::Connecting => Style::default().fg(self.warning),
            ConnectionState::Disconnected => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }
}
