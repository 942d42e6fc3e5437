//! Level styling configuration.

use crate::model::LogLevel;
use ratatui::style::{Color, Modifier, Style};

// ===== ColorConfig =====

/// Configuration for color output.
///
/// Determines whether colors should be enabled or disabled based on:
/// - `--no-color` CLI flag
/// - `NO_COLOR` environment variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorConfig {
    enabled: bool,
}

impl ColorConfig {
    /// Create a ColorConfig from CLI args and environment.
    ///
    /// Priority (first match wins):
    /// 1. `--no-color` flag (disables colors)
    /// 2. `NO_COLOR` env var (any value disables colors)
    /// 3. Default: colors enabled
    pub fn from_env_and_args(no_color_flag: bool) -> Self {
        let enabled = !no_color_flag && std::env::var_os("NO_COLOR").is_none();
        Self { enabled }
    }

    /// Explicit setting, bypassing the environment.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Check if colors are enabled.
    pub fn colors_enabled(self) -> bool {
        self.enabled
    }
}

// ===== LevelStyles =====

/// Styles for the level column and message text.
#[derive(Debug, Clone, Copy)]
pub struct LevelStyles {
    colors: ColorConfig,
}

impl LevelStyles {
    /// Styles honoring the given color configuration.
    pub fn new(colors: ColorConfig) -> Self {
        Self { colors }
    }

    /// Style for a record's level tag.
    ///
    /// ERROR/CRITICAL red, WARNING yellow, INFO cyan, SUCCESS green,
    /// DEBUG dark gray, anything else white.
    pub fn level(&self, level: &LogLevel) -> Style {
        if !self.colors.colors_enabled() {
            return match level {
                LogLevel::Error | LogLevel::Critical => Style::default().add_modifier(Modifier::BOLD),
                _ => Style::default(),
            };
        }
        let color = match level {
            LogLevel::Critical | LogLevel::Error => Color::Red,
            LogLevel::Warning => Color::Yellow,
            LogLevel::Info => Color::Cyan,
            LogLevel::Success => Color::Green,
            LogLevel::Debug => Color::DarkGray,
            LogLevel::Other(_) => Color::White,
        };
        let style = Style::default().fg(color);
        if matches!(level, LogLevel::Critical) {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }

    /// Style for the timestamp column.
    pub fn timestamp(&self) -> Style {
        if self.colors.colors_enabled() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        }
    }
}

impl Default for LevelStyles {
    fn default() -> Self {
        Self::new(ColorConfig::from_env_and_args(false))
    }
}
