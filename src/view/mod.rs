//! TUI rendering and terminal management (impure shell)

pub mod feed;
mod log_pane;
pub mod status_bar;
mod styles;

pub use feed::LiveFeed;
pub use log_pane::{format_record, render_log_pane, wrap_text, LogPaneState};
pub use status_bar::StatusBar;
pub use styles::{ColorConfig, LevelStyles};

use crate::config::{ConfigError, KeyBindings, ResolvedConfig};
use crate::demo::DemoTransport;
use crate::model::{ConfigurationError, KeyAction};
use crate::pipeline::{Decoded, LivePipeline};
use crate::session::{ConnectionSession, ConnectionStatus};
use crate::view_state::ScrollPosition;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    widgets::Paragraph,
    Terminal,
};
use std::io::{self, Stdout};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Input poll timeout; also the longest a decoded record waits to be painted.
const TICK: Duration = Duration::from_millis(50);

/// Upper bound on records applied between two frames.
const MAX_BATCH: usize = 10_000;

/// Lines moved per mouse wheel notch.
const WHEEL_STEP: isize = 3;

/// Errors that can occur during TUI operations
#[derive(Debug, Error)]
pub enum TuiError {
    /// IO error during terminal operations
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),

    /// Settings could not be turned into a session
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Engine or buffer parameters were rejected
    #[error("Invalid settings: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Main TUI application
///
/// Generic over backend to support testing with TestBackend
pub struct TuiApp<B>
where
    B: ratatui::backend::Backend,
{
    terminal: Terminal<B>,
    pipeline: LivePipeline,
    pane: LogPaneState,
    styles: LevelStyles,
    colors: ColorConfig,
    key_bindings: KeyBindings,
    inbox: mpsc::UnboundedReceiver<Decoded>,
    status: watch::Receiver<ConnectionStatus>,
    last_status: ConnectionStatus,
    endpoint: String,
}

impl<B> TuiApp<B>
where
    B: ratatui::backend::Backend,
{
    /// Assemble the app around an already-configured pipeline and feed.
    pub fn new(
        terminal: Terminal<B>,
        pipeline: LivePipeline,
        inbox: mpsc::UnboundedReceiver<Decoded>,
        status: watch::Receiver<ConnectionStatus>,
        endpoint: impl Into<String>,
        colors: ColorConfig,
    ) -> Self {
        let last_status = *status.borrow();
        Self {
            terminal,
            pipeline,
            pane: LogPaneState::new(),
            styles: LevelStyles::new(colors),
            colors,
            key_bindings: KeyBindings::default(),
            inbox,
            status,
            last_status,
            endpoint: endpoint.into(),
        }
    }

    /// Run the main event loop
    ///
    /// Returns when user quits (q or Ctrl+C). Redraws only after input,
    /// newly decoded records, or a connection status change.
    pub fn run(&mut self) -> Result<(), TuiError> {
        self.draw()?;

        loop {
            let mut dirty = false;

            if event::poll(TICK)? {
                match event::read()? {
                    Event::Key(key) if key.kind != KeyEventKind::Release => {
                        if self.handle_key(key) {
                            return Ok(());
                        }
                        dirty = true;
                    }
                    Event::Mouse(mouse) => dirty = self.handle_mouse(mouse),
                    Event::Resize(width, height) => {
                        debug!(width, height, "terminal resized");
                        dirty = true;
                    }
                    _ => {}
                }
            }

            dirty |= self.drain_inbox() > 0;
            dirty |= self.poll_status();

            if dirty {
                self.draw()?;
            }
        }
    }

    /// Apply every decoded record waiting in the inbox, in arrival order.
    ///
    /// Returns how many results were applied (appended or dropped).
    pub fn drain_inbox(&mut self) -> usize {
        let mut applied = 0;
        while applied < MAX_BATCH {
            match self.inbox.try_recv() {
                Ok(decoded) => {
                    self.pipeline.ingest_decoded(decoded);
                    applied += 1;
                }
                Err(_) => break,
            }
        }
        applied
    }

    /// True when the connection status changed since the last frame.
    fn poll_status(&mut self) -> bool {
        let current = *self.status.borrow();
        if current == self.last_status {
            return false;
        }
        debug!(from = %self.last_status, to = %current, "status changed");
        self.last_status = current;
        true
    }

    /// Handle a key press. Returns true when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let Some(action) = self.key_bindings.get(key) else {
            return false;
        };
        let page = isize::try_from(self.pane.viewport_height().max(1)).unwrap_or(isize::MAX);

        match action {
            KeyAction::ScrollUp => self.pipeline.scroll_by(-1),
            KeyAction::ScrollDown => self.pipeline.scroll_by(1),
            KeyAction::PageUp => self.pipeline.scroll_by(-page),
            KeyAction::PageDown => self.pipeline.scroll_by(page),
            KeyAction::ScrollToTop => self.pipeline.scroll_to(ScrollPosition::Top),
            KeyAction::FollowTail => self.pipeline.follow_tail(),
            KeyAction::ClearBuffer => self.pipeline.clear(),
            KeyAction::Quit => return true,
        }
        false
    }

    /// Handle the mouse wheel. Returns true when the view moved.
    fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.pipeline.scroll_by(-WHEEL_STEP),
            MouseEventKind::ScrollDown => self.pipeline.scroll_by(WHEEL_STEP),
            _ => return false,
        }
        true
    }

    /// Render the current frame: log pane above, status bar in the last row.
    pub fn draw(&mut self) -> Result<(), TuiError> {
        let status_line = StatusBar {
            status: self.last_status,
            endpoint: &self.endpoint,
            buffered: self.pipeline.len(),
            stats: self.pipeline.stats(),
            pinned: self.pipeline.is_pinned(),
        }
        .render(self.colors);

        let Self {
            terminal,
            pipeline,
            pane,
            styles,
            ..
        } = self;

        terminal.draw(|frame| {
            let [log_area, status_area] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());
            render_log_pane(pipeline, pane, styles, log_area, frame.buffer_mut());
            frame.render_widget(Paragraph::new(status_line), status_area);
        })?;

        Ok(())
    }

    /// The pipeline behind the pane.
    pub fn pipeline(&self) -> &LivePipeline {
        &self.pipeline
    }

    /// The underlying terminal (TestBackend in tests).
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}

/// Options that only exist on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Feed the viewer from the built-in demo producer.
    pub demo: bool,
    /// Disable colors.
    pub no_color: bool,
}

/// Initialize and run the TUI application.
///
/// Starts a tokio runtime for the connection, attaches the feed, runs the
/// event loop on the calling thread and ensures cleanup on exit.
///
/// Note: Logging must be initialized by caller before calling this function.
pub fn run_with_config(config: &ResolvedConfig, options: RunOptions) -> Result<(), TuiError> {
    let session_config = config.session_config()?;
    let kind = config.message_kind()?;
    let pipeline = LivePipeline::new(config.pipeline_settings()?)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("livelog-io")
        .enable_all()
        .build()?;
    let _guard = runtime.enter();

    let endpoint = if options.demo {
        "demo feed".to_string()
    } else {
        session_config.target.endpoint.clone()
    };
    info!(%endpoint, client_id = %session_config.target.client_id, %kind, "starting session");

    let mut session = if options.demo {
        ConnectionSession::with_transport(session_config, DemoTransport::default())
    } else {
        ConnectionSession::new(session_config)
    };
    let (feed, inbox) = LiveFeed::attach(&session, &kind);
    session.start();

    let result = setup_terminal().and_then(|terminal| {
        let colors = ColorConfig::from_env_and_args(options.no_color);
        let mut app = TuiApp::new(terminal, pipeline, inbox, session.watch_status(), endpoint, colors);
        app.run()
    });

    // Always restore terminal state
    restore_terminal()?;

    runtime.block_on(async {
        session.shutdown().await;
        feed.detach().await;
    });
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(crossterm::event::EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

/// Restore terminal to normal state
///
/// Disables raw mode, mouse capture, and leaves alternate screen
fn restore_terminal() -> Result<(), TuiError> {
    disable_raw_mode()?;
    io::stdout().execute(crossterm::event::DisableMouseCapture)?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
