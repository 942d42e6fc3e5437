//! Status bar: connection state, record counts and follow mode.

use super::styles::ColorConfig;
use crate::pipeline::PipelineStats;
use crate::session::ConnectionStatus;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Snapshot rendered into the bottom row.
///
/// Pure and stateless; the host gathers the values each frame.
#[derive(Debug, Clone)]
pub struct StatusBar<'a> {
    /// Current connection state.
    pub status: ConnectionStatus,
    /// Endpoint shown next to the state.
    pub endpoint: &'a str,
    /// Records currently buffered.
    pub buffered: usize,
    /// Pipeline counters.
    pub stats: PipelineStats,
    /// Whether the view follows the tail.
    pub pinned: bool,
}

impl StatusBar<'_> {
    /// Connection indicator: `[LIVE]`, `[CONNECTING]`, `[OFFLINE]` or `[CLOSING]`.
    pub fn indicator(&self, colors: ColorConfig) -> Span<'static> {
        let (label, color) = match self.status {
            ConnectionStatus::Open => ("[LIVE]", Color::Green),
            ConnectionStatus::Connecting => ("[CONNECTING]", Color::Yellow),
            ConnectionStatus::Disconnected => ("[OFFLINE]", Color::Red),
            ConnectionStatus::Closing => ("[CLOSING]", Color::Gray),
        };
        if colors.colors_enabled() {
            Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD))
        } else {
            Span::raw(label)
        }
    }

    /// Full status line.
    pub fn render(&self, colors: ColorConfig) -> Line<'static> {
        let mut spans = vec![
            self.indicator(colors),
            Span::raw(format!(" {} | {} records", self.endpoint, self.buffered)),
        ];

        let dropped = self.stats.dropped();
        if dropped > 0 {
            let text = format!(" | {dropped} dropped");
            spans.push(if colors.colors_enabled() {
                Span::styled(text, Style::default().fg(Color::Red))
            } else {
                Span::raw(text)
            });
        }
        if self.stats.evicted > 0 {
            spans.push(Span::raw(format!(" | {} evicted", self.stats.evicted)));
        }

        spans.push(Span::raw(if self.pinned {
            " | FOLLOW"
        } else {
            " | PAUSED (G to follow)"
        }));
        Line::from(spans)
    }
}
