use crate::command::{Command, CommandInner};
use crate::component::Component;
use futures::future::BoxFuture;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::Terminal;

/// A headless harness that drives a [`Component`] without a terminal.
///
/// Immediate messages produced by `update` are queued and delivered by
/// [`drain`](ComponentHarness::drain). Futures (async command actions, the
/// closing transition timer) are held until [`settle`](ComponentHarness::settle)
/// runs them to completion on a private current-thread runtime, which makes
/// "stays open until the action settles" observable from a plain `#[test]`.
///
/// ```rust,ignore
/// let mut h = ComponentHarness::new(palette);
/// h.send(Message::Open);
/// h.send(Message::KeyPress(enter));
/// assert!(h.component().is_open());   // action still pending
/// h.settle();
/// assert!(!h.component().is_open());
/// ```
pub struct ComponentHarness<C: Component>
where
    C::Message: Clone,
{
    component: C,
    pending_messages: Vec<C::Message>,
    pending_futures: Vec<BoxFuture<'static, C::Message>>,
    delivered: Vec<C::Message>,
    quit_requested: bool,
}

impl<C: Component> ComponentHarness<C>
where
    C::Message: Clone,
{
    /// Wrap a component.
    pub fn new(component: C) -> Self {
        Self {
            component,
            pending_messages: Vec::new(),
            pending_futures: Vec::new(),
            delivered: Vec::new(),
            quit_requested: false,
        }
    }

    /// Send a message and deliver every immediate follow-up message.
    pub fn send(&mut self, msg: C::Message) {
        let cmd = self.component.update(msg);
        self.collect(cmd);
        self.drain();
    }

    /// Feed a command returned from a direct method call (e.g. `open()`)
    /// through the harness as if the runtime had received it.
    pub fn run(&mut self, cmd: Command<C::Message>) {
        self.collect(cmd);
        self.drain();
    }

    /// Deliver queued immediate messages until none are left.
    pub fn drain(&mut self) {
        while !self.pending_messages.is_empty() {
            let messages: Vec<_> = self.pending_messages.drain(..).collect();
            for msg in messages {
                self.delivered.push(msg.clone());
                let cmd = self.component.update(msg);
                self.collect(cmd);
            }
        }
    }

    /// Run pending futures to completion, delivering their messages, until
    /// no futures or messages remain.
    pub fn settle(&mut self) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("test runtime");
        self.drain();
        while !self.pending_futures.is_empty() {
            let futures: Vec<_> = self.pending_futures.drain(..).collect();
            for fut in futures {
                let msg = runtime.block_on(fut);
                self.pending_messages.push(msg);
                self.drain();
            }
        }
    }

    /// Number of futures waiting for [`settle`](ComponentHarness::settle).
    pub fn pending_futures(&self) -> usize {
        self.pending_futures.len()
    }

    /// Messages delivered through commands so far, in delivery order.
    pub fn delivered(&self) -> &[C::Message] {
        &self.delivered
    }

    /// Whether any command asked the program to quit.
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Shared access to the component for assertions.
    pub fn component(&self) -> &C {
        &self.component
    }

    /// Mutable access for direct setup, bypassing messages.
    pub fn component_mut(&mut self) -> &mut C {
        &mut self.component
    }

    /// Render into a [`Buffer`] of the given size.
    pub fn render(&self, width: u16, height: u16) -> Buffer {
        let backend = ratatui::backend::TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).expect("test backend");
        terminal
            .draw(|frame| {
                let area = frame.area();
                self.component.view(frame, area);
            })
            .expect("test draw");
        terminal.backend().buffer().clone()
    }

    /// Render and return the visible cells as text, one line per row.
    pub fn render_string(&self, width: u16, height: u16) -> String {
        let buf = self.render(width, height);
        let area = Rect::new(0, 0, width, height);
        let mut output = String::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                output.push_str(buf[(x, y)].symbol());
            }
            if y < area.bottom() - 1 {
                output.push('\n');
            }
        }
        output
    }

    fn collect(&mut self, cmd: Command<C::Message>) {
        match cmd.inner {
            CommandInner::None => {}
            CommandInner::Message(msg) => self.pending_messages.push(msg),
            CommandInner::Quit => self.quit_requested = true,
            CommandInner::Future(fut) => self.pending_futures.push(fut),
            CommandInner::Batch(cmds) => {
                for cmd in cmds {
                    self.collect(cmd);
                }
            }
        }
    }
}
