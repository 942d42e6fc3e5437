//! Tests for log pane wrapping, measurement and painting.

use super::*;
use crate::model::LogLevel;
use crate::pipeline::PipelineSettings;
use crate::view::styles::ColorConfig;
use chrono::{TimeZone, Utc};

fn record(message: &str) -> LogRecord {
    let timestamp = Utc
        .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
        .single()
        .expect("valid timestamp");
    LogRecord::new(LogLevel::Info, message, timestamp)
}

fn pipeline_with(messages: &[&str]) -> LivePipeline {
    let mut pipeline = LivePipeline::new(PipelineSettings::default()).expect("valid settings");
    for message in messages {
        pipeline.append(record(message));
    }
    pipeline
}

fn rows_of(buf: &Buffer) -> Vec<String> {
    let width = usize::from(buf.area.width);
    buf.content
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect()
}

fn render(pipeline: &mut LivePipeline, state: &mut LogPaneState, width: u16, height: u16) -> Vec<String> {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    let styles = LevelStyles::new(ColorConfig::new(false));
    render_log_pane(pipeline, state, &styles, area, &mut buf);
    rows_of(&buf)
}

// ===== wrap_text =====

#[test]
fn wrap_text_splits_at_width() {
    assert_eq!(wrap_text("abcdef", 4), vec!["abcd", "ef"]);
}

#[test]
fn wrap_text_keeps_empty_input_as_one_line() {
    assert_eq!(wrap_text("", 10), vec![""]);
}

#[test]
fn wrap_text_honors_embedded_newlines() {
    assert_eq!(wrap_text("one\ntwo\r\n", 10), vec!["one", "two", ""]);
}

#[test]
fn wrap_text_never_splits_wide_characters() {
    assert_eq!(wrap_text("日本語", 5), vec!["日本", "語"]);
}

#[test]
fn wrap_text_expands_tabs() {
    assert_eq!(wrap_text("a\tb", 80), vec!["a    b"]);
}

#[test]
fn wrap_text_zero_width_behaves_as_one() {
    assert_eq!(wrap_text("ab", 0), vec!["a", "b"]);
}

// ===== format_record =====

#[test]
fn format_record_has_timestamp_level_and_message() {
    assert_eq!(format_record(&record("hello")), "03:04:05.000 INFO     hello");
}

#[test]
fn format_record_pads_custom_levels() {
    let custom = LogRecord::new(LogLevel::Other("AUDIT".into()), "x", record("").timestamp());
    assert_eq!(format_record(&custom), "03:04:05.000 AUDIT    x");
}

// ===== render_log_pane =====

#[test]
fn empty_pipeline_shows_placeholder() {
    let mut pipeline = pipeline_with(&[]);
    let mut state = LogPaneState::new();

    let rows = render(&mut pipeline, &mut state, 40, 4);

    assert!(rows[0].starts_with(PLACEHOLDER));
    assert!(state.last_window().is_none());
}

#[test]
fn pinned_pane_shows_newest_records_at_bottom() {
    let messages: Vec<String> = (0..20).map(|i| format!("record {i}")).collect();
    let refs: Vec<&str> = messages.iter().map(String::as_str).collect();
    let mut pipeline = pipeline_with(&refs);
    let mut state = LogPaneState::new();

    let rows = render(&mut pipeline, &mut state, 40, 5);

    assert!(rows[0].contains("record 15"), "top row: {:?}", rows[0]);
    assert!(rows[4].contains("record 19"), "bottom row: {:?}", rows[4]);
    let window = state.last_window().expect("window");
    assert_eq!(window.last_visible_index, 19);
}

#[test]
fn wrapped_record_reports_measured_height() {
    let long = "x".repeat(60);
    let mut pipeline = pipeline_with(&["short", &long]);
    let mut state = LogPaneState::new();
    let before = pipeline.total_size();

    let rows = render(&mut pipeline, &mut state, 41, 10);

    // 22 columns of header + 60 of message over 40 text columns.
    let tail = pipeline.get_index(1).expect("row").sequence();
    assert_eq!(pipeline.engine().row_height(tail), Some(3));
    assert_eq!(pipeline.total_size(), before + 2);
    assert!(rows[0].contains("short"));
    assert!(rows[1].starts_with("03:04:05.000 INFO     xxx"));
    assert!(rows[3].starts_with("xx"));
}

#[test]
fn width_change_remeasures_rows() {
    let long = "y".repeat(30);
    let mut pipeline = pipeline_with(&[&long]);
    let mut state = LogPaneState::new();
    let sequence = pipeline.get_index(0).expect("row").sequence();

    render(&mut pipeline, &mut state, 81, 10);
    assert_eq!(pipeline.engine().row_height(sequence), Some(1));

    render(&mut pipeline, &mut state, 27, 10);
    assert_eq!(pipeline.engine().row_height(sequence), Some(2));
}

#[test]
fn scrolled_pane_stays_on_selected_rows() {
    let messages: Vec<String> = (0..50).map(|i| format!("record {i}")).collect();
    let refs: Vec<&str> = messages.iter().map(String::as_str).collect();
    let mut pipeline = pipeline_with(&refs);
    let mut state = LogPaneState::new();

    render(&mut pipeline, &mut state, 40, 5);
    pipeline.scroll_to(crate::view_state::ScrollPosition::Top);
    let rows = render(&mut pipeline, &mut state, 40, 5);

    assert!(rows[0].contains("record 0 "));
    assert!(rows[4].contains("record 4 "));
    assert!(!pipeline.is_pinned());
}

#[test]
fn overflowing_content_draws_scrollbar() {
    let messages: Vec<String> = (0..30).map(|i| format!("record {i}")).collect();
    let refs: Vec<&str> = messages.iter().map(String::as_str).collect();
    let mut pipeline = pipeline_with(&refs);
    let mut state = LogPaneState::new();

    let rows = render(&mut pipeline, &mut state, 40, 5);

    assert!(rows
        .iter()
        .all(|row| row.chars().last().is_some_and(|c| c != ' ')));
}

#[test]
fn short_content_has_no_scrollbar() {
    let mut pipeline = pipeline_with(&["only"]);
    let mut state = LogPaneState::new();

    let rows = render(&mut pipeline, &mut state, 40, 5);

    assert!(rows.iter().all(|row| row.ends_with(' ')));
}
