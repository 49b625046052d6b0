//! # Palette Example
//!
//! A small editor shell with two command palettes:
//! - `Ctrl+K` opens the main palette (the designated instance)
//! - "Change Theme" opens a second, independent palette of themes
//! - "Sync Workspace" is an async action; the palette stays open until it settles
//! - Recents and favorites persist in the platform data directory
//!
//! Logs go to `orixis-palette.log` in the system temp directory.
//!
//! Run with: `cargo run --example palette`

use orixis::crossterm::event::{KeyCode, KeyModifiers};
use orixis::palette::config::{PaletteSize, Theme};
use orixis::palette::{
    ActionError, AsyncAction, CommandDescriptor, FileStore, InstanceId, MemoryStore, Message,
    PaletteConfig, PaletteError, RegistryMessage, RegistryService,
};
use orixis::ratatui::layout::{Constraint, Layout};
use orixis::ratatui::style::{Color, Style};
use orixis::ratatui::text::Line;
use orixis::ratatui::widgets::{Block, Paragraph};
use orixis::ratatui::Frame;
use orixis::{Command, Component, Model, ProgramOptions, TerminalEvent};
use std::time::Duration;

struct Editor {
    registry: RegistryService,
    main: InstanceId,
    themes: InstanceId,
    status: String,
    theme: String,
}

#[derive(Debug)]
enum Msg {
    Palette(RegistryMessage),
    Quit,
}

fn main_commands() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("file.open", "Open File")
            .category("files")
            .icon("file")
            .shortcut("Ctrl+O")
            .description("Open a file from disk"),
        CommandDescriptor::new("file.save", "Save File")
            .category("files")
            .icon("file")
            .shortcut("Ctrl+S"),
        CommandDescriptor::new("nav.symbol", "Go to Symbol")
            .category("navigation")
            .icon("navigation")
            .keywords(["outline", "jump"]),
        CommandDescriptor::new("settings.theme", "Change Theme")
            .category("settings")
            .icon("settings"),
        CommandDescriptor::new("workspace.sync", "Sync Workspace")
            .description("Pull remote changes")
            .action(AsyncAction::new(|_ctx| async {
                orixis::tokio::time::sleep(Duration::from_millis(600)).await;
                Ok::<(), ActionError>(())
            })),
        CommandDescriptor::new("help.docs", "Open Documentation")
            .category("help")
            .icon("help"),
        CommandDescriptor::new("app.quit", "Quit").shortcut("Ctrl+Q"),
    ]
}

fn theme_commands() -> Vec<CommandDescriptor> {
    ["Dark", "Light", "Minimal"]
        .into_iter()
        .map(|name| {
            CommandDescriptor::new(format!("theme.{}", name.to_lowercase()), name)
                .category("settings")
        })
        .collect()
}

/// Palettes are created in `main` so configuration errors surface there.
struct Setup {
    registry: RegistryService,
    main: InstanceId,
    themes: InstanceId,
}

fn setup() -> Result<Setup, PaletteError> {
    let mut registry = match FileStore::in_data_dir() {
        Some(store) => RegistryService::new(store),
        None => RegistryService::new(MemoryStore::new()),
    };
    let main = registry.create(PaletteConfig::default(), main_commands())?;
    let themes = registry.create(
        PaletteConfig::default()
            .with_title("Themes")
            .with_size(PaletteSize::Small)
            .with_theme(Theme::Light)
            .with_placeholder("Pick a theme..."),
        theme_commands(),
    )?;
    registry.designate(main);
    registry.set_context(main, serde_json::json!({ "workspace": "demo" }));
    Ok(Setup {
        registry,
        main,
        themes,
    })
}

impl Model for Editor {
    type Message = Msg;
    type Flags = Setup;

    fn init(setup: Setup) -> (Self, Command<Msg>) {
        let editor = Editor {
            registry: setup.registry,
            main: setup.main,
            themes: setup.themes,
            status: "Press Ctrl+K for commands, q to quit".to_string(),
            theme: "Dark".to_string(),
        };
        (editor, Command::none())
    }

    fn update(&mut self, msg: Msg) -> Command<Msg> {
        let msg = match msg {
            Msg::Quit => return Command::quit(),
            Msg::Palette(msg) => msg,
        };

        let mut follow_up = Command::none();
        if let RegistryMessage::Instance { id, msg: event } = &msg {
            match event {
                Message::Executed(command) => {
                    self.status = format!("Ran {command}");
                    follow_up = self.on_executed(*id, command);
                }
                Message::ActionFailed { id: command, error } => {
                    self.status = format!("{command} failed: {error}");
                }
                _ => {}
            }
        }
        let palette = self.registry.update(msg).map(Msg::Palette);
        Command::batch([palette, follow_up])
    }

    fn view(&self, frame: &mut Frame) {
        let area = frame.area();
        let [body, status] = Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);

        let text = vec![
            Line::from("orixis palette demo"),
            Line::from(""),
            Line::from(format!("Theme: {}", self.theme)),
            Line::from("Ctrl+K  open palette"),
            Line::from("q       quit"),
        ];
        frame.render_widget(
            Paragraph::new(text).block(Block::bordered().title(" Editor ")),
            body,
        );
        frame.render_widget(
            Paragraph::new(self.status.as_str()).style(Style::default().fg(Color::DarkGray)),
            status,
        );

        self.registry.view(frame, area);
    }

    fn on_event(&self, event: TerminalEvent) -> Option<Msg> {
        match event {
            TerminalEvent::Key(key) => {
                let typing = self.registry.focused_instance().is_some();
                match (key.code, key.modifiers) {
                    (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Msg::Quit),
                    (KeyCode::Char('q'), KeyModifiers::NONE) if !typing => Some(Msg::Quit),
                    _ => Some(Msg::Palette(RegistryMessage::Key(key))),
                }
            }
            TerminalEvent::Mouse(mouse) => Some(Msg::Palette(RegistryMessage::Mouse(mouse))),
            _ => None,
        }
    }
}

impl Editor {
    fn on_executed(&mut self, from: InstanceId, command: &str) -> Command<Msg> {
        if from == self.themes {
            if let Some(name) = command.strip_prefix("theme.") {
                self.theme = name.to_string();
            }
            return Command::none();
        }
        debug_assert_eq!(from, self.main);
        match command {
            "app.quit" => Command::quit(),
            "settings.theme" => self.registry.open(self.themes).map(Msg::Palette),
            _ => Command::none(),
        }
    }
}

#[orixis::tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = ProgramOptions {
        title: Some("orixis palette".to_string()),
        log_file: Some(std::env::temp_dir().join("orixis-palette.log")),
        ..ProgramOptions::default()
    };
    orixis::run_with::<Editor>(setup()?, options).await?;
    Ok(())
}
