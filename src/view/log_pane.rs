//! Log pane: paints the records inside the current viewport window.
//!
//! Only records in the window are wrapped and measured. Each measured height
//! is reported back to the pipeline so offsets converge on the real layout,
//! and measurements are discarded whenever the wrap width changes.

use super::styles::LevelStyles;
use crate::model::{LogRecord, Sequence};
use crate::pipeline::LivePipeline;
use crate::view_state::ViewportWindow;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget},
};
use tracing::debug;
use unicode_width::UnicodeWidthChar;

/// Measurement passes per frame before painting with whatever was found.
const MAX_MEASURE_PASSES: usize = 3;

/// Timestamp column format, `HH:MM:SS.mmm`.
const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";

/// Width of the level column, padded.
const LEVEL_COLUMN: usize = 8;

/// Tab stops are expanded to this many spaces.
const TAB_WIDTH: usize = 4;

const PLACEHOLDER: &str = "waiting for log records...";

/// State carried between frames.
#[derive(Debug, Default, Clone)]
pub struct LogPaneState {
    wrap_width: Option<usize>,
    viewport_height: usize,
    last_window: Option<ViewportWindow>,
}

impl LogPaneState {
    /// Create empty pane state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Height of the text area in the last frame (for page scrolling).
    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    /// Window painted in the last frame.
    pub fn last_window(&self) -> Option<&ViewportWindow> {
        self.last_window.as_ref()
    }
}

/// Header written before every record: timestamp and padded level.
fn header(record: &LogRecord) -> (String, String) {
    let timestamp = record.timestamp().format(TIMESTAMP_FORMAT).to_string();
    let level = format!("{:<width$}", record.level().as_str(), width = LEVEL_COLUMN);
    (timestamp, level)
}

/// Full text of a record as one logical line (before wrapping).
pub fn format_record(record: &LogRecord) -> String {
    let (timestamp, level) = header(record);
    format!("{timestamp} {level} {}", record.message())
}

/// Wrap `text` to `width` display columns.
///
/// Embedded newlines start a new line, tabs expand to spaces, and wide
/// characters never straddle the edge. Always yields at least one line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for segment in text.split('\n') {
        let segment = segment.strip_suffix('\r').unwrap_or(segment);
        let mut line = String::new();
        let mut used = 0usize;

        let expanded = segment
            .chars()
            .flat_map(|c| {
                let (ch, n) = if c == '\t' { (' ', TAB_WIDTH) } else { (c, 1) };
                std::iter::repeat(ch).take(n)
            });
        for ch in expanded {
            let w = ch.width().unwrap_or(0);
            if used + w > width && used > 0 {
                lines.push(std::mem::take(&mut line));
                used = 0;
            }
            line.push(ch);
            used += w;
        }
        lines.push(line);
    }

    lines
}

/// Rendered lines for one record.
fn record_lines(record: &LogRecord, width: usize) -> Vec<String> {
    wrap_text(&format_record(record), width)
}

/// Style the header of a record's first line, leaving the rest plain.
fn styled_line<'a>(text: &'a str, first: bool, record: &LogRecord, styles: &LevelStyles) -> Line<'a> {
    if !first {
        return Line::raw(text);
    }
    let (timestamp, level) = header(record);
    let header_len = timestamp.len() + 1 + level.len();
    if text.len() < header_len || !text.is_char_boundary(header_len) {
        return Line::raw(text);
    }
    let (ts, rest) = text.split_at(timestamp.len());
    let (sep, rest) = rest.split_at(1);
    let (lvl, body) = rest.split_at(level.len());
    Line::from(vec![
        Span::styled(ts, styles.timestamp()),
        Span::raw(sep),
        Span::styled(lvl, styles.level(record.level())),
        Span::raw(body),
    ])
}

/// Measure the rows in the window and report any height that differs from
/// what the engine holds. Returns the wrapped lines per row and whether any
/// height changed.
fn measure(
    pipeline: &mut LivePipeline,
    window: &ViewportWindow,
    width: usize,
) -> (Vec<(usize, Vec<String>)>, bool) {
    let mut rows = Vec::with_capacity(window.len());
    let mut updates: Vec<(Sequence, u16)> = Vec::new();

    for index in window.indices() {
        let Some(entry) = pipeline.get_index(index) else {
            continue;
        };
        let lines = record_lines(entry.record(), width);
        let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        let sequence = entry.sequence();
        if pipeline.engine().row_height(sequence) != Some(usize::from(height)) {
            updates.push((sequence, height));
        }
        rows.push((index, lines));
    }

    let changed = !updates.is_empty();
    for (sequence, height) in updates {
        if let Err(err) = pipeline.report_measured_height(sequence, height) {
            debug!(%sequence, %err, "measurement rejected");
        }
    }
    (rows, changed)
}

/// Paint the pipeline's current window into `area`.
///
/// The rightmost column holds a scrollbar sized from `total_size`.
pub fn render_log_pane(
    pipeline: &mut LivePipeline,
    state: &mut LogPaneState,
    styles: &LevelStyles,
    area: Rect,
    buf: &mut Buffer,
) {
    if area.is_empty() {
        return;
    }
    let text_width = usize::from(area.width.saturating_sub(1)).max(1);
    let height = usize::from(area.height);
    state.viewport_height = height;

    if state.wrap_width != Some(text_width) {
        if state.wrap_width.is_some() {
            debug!(width = text_width, "wrap width changed, discarding measurements");
        }
        pipeline.reset_measurements();
        state.wrap_width = Some(text_width);
    }

    let mut painted = None;
    for _ in 0..MAX_MEASURE_PASSES {
        let Some(window) = pipeline.window(height) else {
            break;
        };
        let (rows, changed) = measure(pipeline, &window, text_width);
        painted = Some((window, rows));
        if !changed {
            break;
        }
    }

    let Some((mut window, rows)) = painted else {
        state.last_window = None;
        buf.set_string(
            area.x,
            area.y,
            PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        );
        return;
    };

    // The final pass may have moved offsets; take positions from a fresh window.
    if let Some(fresh) = pipeline.window(height) {
        window = fresh;
    }

    for (index, lines) in &rows {
        let Some(top) = window.viewport_row(*index) else {
            continue;
        };
        let Some(entry) = pipeline.get_index(*index) else {
            continue;
        };
        for (k, text) in lines.iter().enumerate() {
            let y = top + k as isize;
            if y < 0 || y >= height as isize {
                continue;
            }
            let line = styled_line(text, k == 0, entry.record(), styles);
            buf.set_line(area.x, area.y + y as u16, &line, text_width as u16);
        }
    }

    let scrollable = window.total_size.saturating_sub(height);
    if scrollable > 0 {
        let mut scrollbar = ScrollbarState::new(scrollable)
            .position(window.scroll_offset)
            .viewport_content_length(height);
        Scrollbar::new(ScrollbarOrientation::VerticalRight).render(area, buf, &mut scrollbar);
    }

    state.last_window = Some(window);
}

#[cfg(test)]
#[path = "log_pane_tests.rs"]
mod tests;
