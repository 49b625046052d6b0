use crate::command::Command;
use crate::event::TerminalEvent;
use ratatui::Frame;

/// The top-level application driven by a [`Program`](crate::Program).
///
/// The runtime calls [`init`](Model::init) once, then loops: every terminal
/// event goes through [`on_event`](Model::on_event), the resulting message (if
/// any) through [`update`](Model::update), and the next frame is drawn with
/// [`view`](Model::view).
pub trait Model: Sized + Send + 'static {
    /// The application's message type.
    type Message: Send + 'static;

    /// Startup data passed to [`Model::init`].
    type Flags: Send + 'static;

    /// Create the initial state and an optional startup command.
    fn init(flags: Self::Flags) -> (Self, Command<Self::Message>);

    /// Process a message, mutate state, and return a command for side effects.
    fn update(&mut self, msg: Self::Message) -> Command<Self::Message>;

    /// Render the current state. Must be a pure function of `&self`.
    fn view(&self, frame: &mut Frame);

    /// Map a terminal event to a message. Returning `None` drops the event.
    fn on_event(&self, event: TerminalEvent) -> Option<Self::Message>;
}
