use crate::command::{Command, CommandInner};
use crate::event::TerminalEvent;
use crate::model::Model;
use crossterm::{
    cursor,
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        EventStream,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout, Stdout};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Errors that can occur while initializing or running a [`Program`].
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// An I/O error from terminal setup, rendering, or teardown.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// The `tracing` subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// Configuration options for a [`Program`].
///
/// Override only what you need with struct update syntax:
///
/// ```rust,ignore
/// let opts = ProgramOptions {
///     mouse: true,
///     log_file: Some("palette.log".into()),
///     ..ProgramOptions::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ProgramOptions {
    /// Target frames per second (default: 60, clamped to 1..=120).
    pub fps: u32,
    /// Start in alternate screen (default: true).
    pub alt_screen: bool,
    /// Enable mouse capture (default: true; rows and categories are clickable).
    pub mouse: bool,
    /// Enable bracketed paste (default: true).
    pub bracketed_paste: bool,
    /// Set terminal title.
    pub title: Option<String>,
    /// Restore the terminal from a panic hook (default: true).
    pub catch_panics: bool,
    /// Quit on Ctrl+C delivered as a signal (default: true).
    pub handle_signals: bool,
    /// Append `tracing` output to this file.
    pub log_file: Option<PathBuf>,
    /// Filter directives for the log file (default: [`DEFAULT_DIRECTIVES`](crate::logging::DEFAULT_DIRECTIVES)).
    pub log_directives: String,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            fps: 60,
            alt_screen: true,
            mouse: true,
            bracketed_paste: true,
            title: None,
            catch_panics: true,
            handle_signals: true,
            log_file: None,
            log_directives: crate::logging::DEFAULT_DIRECTIVES.to_string(),
        }
    }
}

/// Owns the terminal and drives a [`Model`] until it returns [`Command::quit`].
///
/// Work returned as futures is spawned on the tokio runtime, so a slow command
/// action never blocks input handling; its message is delivered whenever it
/// settles.
pub struct Program<M: Model> {
    model: M,
    terminal: Terminal<CrosstermBackend<Stdout>>,
    msg_tx: mpsc::UnboundedSender<M::Message>,
    msg_rx: mpsc::UnboundedReceiver<M::Message>,
    options: ProgramOptions,
    needs_redraw: bool,
    should_quit: bool,
}

impl<M: Model> Program<M> {
    /// Create a new program with default options.
    pub fn new(flags: M::Flags) -> Result<Self, ProgramError> {
        Self::with_options(flags, ProgramOptions::default())
    }

    /// Create a new program with custom options.
    pub fn with_options(flags: M::Flags, options: ProgramOptions) -> Result<Self, ProgramError> {
        if let Some(ref path) = options.log_file {
            crate::logging::init_file_logging(path, &options.log_directives)?;
        }

        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (model, init_cmd) = M::init(flags);
        let terminal = init_terminal(&options)?;

        let mut program = Self {
            model,
            terminal,
            msg_tx,
            msg_rx,
            options,
            needs_redraw: true,
            should_quit: false,
        };
        tracing::debug!("program initialized");
        program.execute_command(init_cmd);
        Ok(program)
    }

    /// Get a sender for injecting messages from outside the loop.
    pub fn sender(&self) -> mpsc::UnboundedSender<M::Message> {
        self.msg_tx.clone()
    }

    /// Run until quit and hand back the final model.
    pub async fn run(mut self) -> Result<M, ProgramError> {
        let outcome = self.event_loop().await;
        tracing::debug!("shutting down");
        restore_terminal(&self.options)?;
        outcome?;
        Ok(self.model)
    }

    async fn event_loop(&mut self) -> Result<(), ProgramError> {
        self.render()?;

        let fps = self.options.fps.clamp(1, 120);
        let mut frame_interval = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
        frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut events = EventStream::new();
        let handle_signals = self.options.handle_signals;

        loop {
            tokio::select! {
                biased;

                _ = tokio::signal::ctrl_c(), if handle_signals => {
                    tracing::debug!("received ctrl+c signal");
                    return Ok(());
                }

                Some(event) = events.next() => {
                    match event {
                        Ok(event) => {
                            let event = TerminalEvent::from(event);
                            if let TerminalEvent::Resize(..) = event {
                                self.needs_redraw = true;
                            }
                            if let Some(msg) = self.model.on_event(event) {
                                self.process_message(msg);
                            }
                        }
                        Err(err) => tracing::warn!(%err, "terminal event stream error"),
                    }
                }

                Some(msg) = self.msg_rx.recv() => {
                    self.process_message(msg);
                    while let Ok(msg) = self.msg_rx.try_recv() {
                        self.process_message(msg);
                    }
                }

                _ = frame_interval.tick() => {
                    if self.needs_redraw {
                        self.render()?;
                        self.needs_redraw = false;
                    }
                }
            }

            if self.should_quit {
                return Ok(());
            }
        }
    }

    fn process_message(&mut self, msg: M::Message) {
        let cmd = self.model.update(msg);
        self.execute_command(cmd);
        self.needs_redraw = true;
    }

    fn execute_command(&mut self, cmd: Command<M::Message>) {
        match cmd.inner {
            CommandInner::None => {}
            CommandInner::Message(msg) => {
                let _ = self.msg_tx.send(msg);
            }
            CommandInner::Quit => {
                self.should_quit = true;
            }
            CommandInner::Future(fut) => {
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let msg = fut.await;
                    let _ = tx.send(msg);
                });
            }
            CommandInner::Batch(cmds) => {
                for cmd in cmds {
                    self.execute_command(cmd);
                }
            }
        }
    }

    fn render(&mut self) -> Result<(), ProgramError> {
        self.terminal.draw(|frame| {
            self.model.view(frame);
        })?;
        Ok(())
    }
}

fn init_terminal(options: &ProgramOptions) -> Result<Terminal<CrosstermBackend<Stdout>>, ProgramError> {
    if options.catch_panics {
        use std::sync::Once;
        static HOOK_INSTALLED: Once = Once::new();
        let alt_screen = options.alt_screen;
        HOOK_INSTALLED.call_once(|| {
            let original_hook = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                let _ = restore_terminal_minimal(alt_screen);
                original_hook(info);
            }));
        });
    }

    enable_raw_mode()?;
    let mut writer = stdout();
    if options.alt_screen {
        execute!(writer, EnterAlternateScreen)?;
    }
    if options.bracketed_paste {
        execute!(writer, EnableBracketedPaste)?;
    }
    if options.mouse {
        execute!(writer, EnableMouseCapture)?;
    }
    if let Some(ref title) = options.title {
        execute!(writer, SetTitle(title))?;
    }
    execute!(writer, cursor::Hide)?;

    Ok(Terminal::new(CrosstermBackend::new(writer))?)
}

fn restore_terminal(options: &ProgramOptions) -> Result<(), ProgramError> {
    restore_terminal_minimal(options.alt_screen)?;
    Ok(())
}

fn restore_terminal_minimal(alt_screen: bool) -> Result<(), io::Error> {
    // Keep going on individual failures so as much state as possible is restored.
    let raw = disable_raw_mode();
    let mut writer = stdout();
    execute!(writer, DisableBracketedPaste).ok();
    execute!(writer, DisableMouseCapture).ok();
    execute!(writer, cursor::Show).ok();
    if alt_screen {
        execute!(writer, LeaveAlternateScreen).ok();
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let opts = ProgramOptions::default();
        assert_eq!(opts.fps, 60);
        assert!(opts.alt_screen);
        assert!(opts.mouse);
        assert!(opts.log_file.is_none());
    }

    #[test]
    fn io_errors_convert() {
        let err: ProgramError = io::Error::other("boom").into();
        assert!(err.to_string().contains("boom"));
    }
}
