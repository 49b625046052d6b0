use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A side effect returned from an `update` call.
///
/// Widgets never run work themselves: they describe it as a `Command` and the
/// [`Program`](crate::Program) (or a [`ComponentHarness`](crate::testing::ComponentHarness)
/// in tests) carries it out and feeds the resulting message back in.
///
/// ```rust,ignore
/// // Nothing to do:
/// let cmd = Command::none();
///
/// // Run a command action and report how it went:
/// let cmd = Command::perform(action_future, |result| Msg::Settled(result));
///
/// // Finish the closing transition later:
/// let cmd = Command::tick(Duration::from_millis(120), |_| Msg::CloseFinished);
/// ```
pub struct Command<Msg: Send + 'static> {
    pub(crate) inner: CommandInner<Msg>,
}

pub(crate) enum CommandInner<Msg: Send + 'static> {
    None,
    Message(Msg),
    Quit,
    Future(BoxFuture<'static, Msg>),
    Batch(Vec<Command<Msg>>),
}

impl<Msg: Send + 'static> Command<Msg> {
    /// No-op command.
    pub fn none() -> Self {
        Command {
            inner: CommandInner::None,
        }
    }

    /// Deliver a message on the next turn of the event loop.
    pub fn message(msg: Msg) -> Self {
        Command {
            inner: CommandInner::Message(msg),
        }
    }

    /// Stop the program.
    pub fn quit() -> Self {
        Command {
            inner: CommandInner::Quit,
        }
    }

    /// Run a future off the input path and map its output to a message.
    pub fn perform<F, T>(future: F, map: impl FnOnce(T) -> Msg + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Command {
            inner: CommandInner::Future(Box::pin(async move { map(future.await) })),
        }
    }

    /// One-shot timer: fires once after `duration`.
    pub fn tick(duration: Duration, map: impl FnOnce(Instant) -> Msg + Send + 'static) -> Self {
        Command {
            inner: CommandInner::Future(Box::pin(async move {
                tokio::time::sleep(duration).await;
                map(Instant::now())
            })),
        }
    }

    /// Run several commands. Empty input collapses to [`Command::none`] and a
    /// single command is returned as-is.
    pub fn batch(cmds: impl IntoIterator<Item = Command<Msg>>) -> Self {
        let mut cmds: Vec<_> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Command::none(),
            1 => cmds.pop().map_or_else(Command::none, |cmd| cmd),
            _ => Command {
                inner: CommandInner::Batch(cmds),
            },
        }
    }

    /// Lift the message type, used when a parent embeds a child component.
    pub fn map<NewMsg: Send + 'static>(
        self,
        f: impl Fn(Msg) -> NewMsg + Send + Sync + 'static,
    ) -> Command<NewMsg> {
        self.map_with(Arc::new(f))
    }

    fn map_with<NewMsg: Send + 'static>(
        self,
        f: Arc<dyn Fn(Msg) -> NewMsg + Send + Sync>,
    ) -> Command<NewMsg> {
        match self.inner {
            CommandInner::None => Command::none(),
            CommandInner::Message(msg) => Command::message(f(msg)),
            CommandInner::Quit => Command::quit(),
            CommandInner::Future(fut) => Command {
                inner: CommandInner::Future(Box::pin(async move { f(fut.await) })),
            },
            CommandInner::Batch(cmds) => Command {
                inner: CommandInner::Batch(
                    cmds.into_iter().map(|cmd| cmd.map_with(f.clone())).collect(),
                ),
            },
        }
    }

    // --- Inspection methods (useful for testing) ---

    /// Returns `true` if this is a no-op command.
    pub fn is_none(&self) -> bool {
        matches!(self.inner, CommandInner::None)
    }

    /// Returns `true` if this command asks the program to stop.
    pub fn is_quit(&self) -> bool {
        matches!(self.inner, CommandInner::Quit)
    }

    /// If this command is an immediate message, return it.
    pub fn into_message(self) -> Option<Msg> {
        match self.inner {
            CommandInner::Message(msg) => Some(msg),
            _ => None,
        }
    }

    /// If this command is a batch, return the inner commands.
    pub fn into_batch(self) -> Option<Vec<Command<Msg>>> {
        match self.inner {
            CommandInner::Batch(cmds) => Some(cmds),
            _ => None,
        }
    }

    /// Every immediate message in this command, batches flattened in order.
    /// Futures and quit requests are dropped.
    pub fn into_messages(self) -> Vec<Msg> {
        let mut out = Vec::new();
        self.collect_messages(&mut out);
        out
    }

    fn collect_messages(self, out: &mut Vec<Msg>) {
        match self.inner {
            CommandInner::Message(msg) => out.push(msg),
            CommandInner::Batch(cmds) => {
                for cmd in cmds {
                    cmd.collect_messages(out);
                }
            }
            CommandInner::None | CommandInner::Quit | CommandInner::Future(_) => {}
        }
    }

    /// Returns `true` if this command (or any command in its batch) runs a future.
    pub fn has_future(&self) -> bool {
        match &self.inner {
            CommandInner::Future(_) => true,
            CommandInner::Batch(cmds) => cmds.iter().any(Command::has_future),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_none() {
        let cmd: Command<()> = Command::none();
        assert!(cmd.is_none());
    }

    #[test]
    fn batch_drops_noops_and_unwraps_single() {
        let cmd: Command<i32> = Command::batch(vec![Command::none(), Command::message(7)]);
        assert_eq!(cmd.into_message(), Some(7));
    }

    #[test]
    fn batch_of_nothing_is_none() {
        let cmd: Command<i32> = Command::batch(vec![Command::none(), Command::none()]);
        assert!(cmd.is_none());
    }

    #[test]
    fn map_message() {
        let cmd: Command<i32> = Command::message(42);
        let mapped: Command<String> = cmd.map(|n| n.to_string());
        assert_eq!(mapped.into_message().as_deref(), Some("42"));
    }

    #[test]
    fn map_keeps_quit() {
        let cmd: Command<i32> = Command::quit();
        assert!(cmd.map(|n| n + 1).is_quit());
    }

    #[test]
    fn into_messages_flattens_nested_batches() {
        let inner: Command<i32> = Command::batch(vec![Command::message(2), Command::message(3)]);
        let cmd = Command::batch(vec![Command::message(1), inner, Command::quit()]);
        assert_eq!(cmd.into_messages(), vec![1, 2, 3]);
    }

    #[test]
    fn has_future_sees_through_batches() {
        let cmd: Command<i32> = Command::batch(vec![
            Command::message(1),
            Command::perform(async { 2 }, |n| n),
        ]);
        assert!(cmd.has_future());
        let plain: Command<i32> = Command::message(1);
        assert!(!plain.has_future());
    }
}
