use crossterm::event::{KeyEvent, MouseEvent};

/// Terminal input delivered to [`Model::on_event`](crate::Model::on_event).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// A keyboard event.
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// Terminal resized to (columns, rows).
    Resize(u16, u16),
    /// Bracketed paste content.
    Paste(String),
    /// Focus gained or lost; the payload is the new focus state.
    Focus(bool),
}

impl From<crossterm::event::Event> for TerminalEvent {
    fn from(event: crossterm::event::Event) -> Self {
        match event {
            crossterm::event::Event::Key(k) => TerminalEvent::Key(k),
            crossterm::event::Event::Mouse(m) => TerminalEvent::Mouse(m),
            crossterm::event::Event::Resize(w, h) => TerminalEvent::Resize(w, h),
            crossterm::event::Event::FocusGained => TerminalEvent::Focus(true),
            crossterm::event::Event::FocusLost => TerminalEvent::Focus(false),
            crossterm::event::Event::Paste(s) => TerminalEvent::Paste(s),
        }
    }
}
