use crate::command::Command;
use ratatui::{layout::Rect, Frame};

/// A widget with its own message type that renders into a region chosen by
/// its parent.
///
/// Parents wrap the child's message in one of their own variants and lift
/// commands with [`Command::map`]:
///
/// ```rust,ignore
/// enum AppMsg { Palette(palette::Message), Quit }
///
/// fn update(&mut self, msg: AppMsg) -> Command<AppMsg> {
///     match msg {
///         AppMsg::Palette(m) => self.palette.update(m).map(AppMsg::Palette),
///         AppMsg::Quit => Command::quit(),
///     }
/// }
/// ```
pub trait Component: Send + 'static {
    /// The component's internal message type.
    type Message: Send + 'static;

    /// Process a message, mutate state, and return a [`Command`] for side effects.
    fn update(&mut self, msg: Self::Message) -> Command<Self::Message>;

    /// Render into `area`. Implementations must stay inside the rectangle.
    fn view(&self, frame: &mut Frame, area: Rect);

    /// Whether this component currently wants keyboard input.
    fn focused(&self) -> bool {
        false
    }
}
