//! Command descriptors and the action interface they carry.

use crate::error::ActionError;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Caller-supplied payload handed to every action a palette runs.
///
/// One command list can behave differently per call site by changing the
/// context with [`Palette::set_context`](crate::palette::Palette::set_context).
pub type ContextData = serde_json::Value;

/// Default category for commands that do not name one.
pub const DEFAULT_CATEGORY: &str = "actions";

/// Result of invoking a [`CommandAction`].
pub enum ActionOutcome {
    /// The action finished synchronously.
    Done(Result<(), ActionError>),
    /// The action continues asynchronously; the palette stays open until it
    /// settles (unless it was run in the background).
    Pending(BoxFuture<'static, Result<(), ActionError>>),
}

impl fmt::Debug for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Done(result) => f.debug_tuple("Done").field(result).finish(),
            ActionOutcome::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Something a command does when it is executed.
pub trait CommandAction: Send + Sync + 'static {
    /// Run the action with the palette's current context.
    fn execute(&self, context: &ContextData) -> ActionOutcome;
}

/// Synchronous action backed by a closure.
pub struct FnAction<F>(F);

impl<F> FnAction<F>
where
    F: Fn(&ContextData) -> Result<(), ActionError> + Send + Sync + 'static,
{
    /// Wrap a closure.
    pub fn new(f: F) -> Self {
        FnAction(f)
    }
}

impl<F> CommandAction for FnAction<F>
where
    F: Fn(&ContextData) -> Result<(), ActionError> + Send + Sync + 'static,
{
    fn execute(&self, context: &ContextData) -> ActionOutcome {
        ActionOutcome::Done((self.0)(context))
    }
}

/// Asynchronous action: a factory producing a fresh future per execution.
pub struct AsyncAction<F>(F);

impl<F, Fut> AsyncAction<F>
where
    F: Fn(ContextData) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
{
    /// Wrap a future factory. The context is cloned into each call.
    pub fn new(f: F) -> Self {
        AsyncAction(f)
    }
}

impl<F, Fut> CommandAction for AsyncAction<F>
where
    F: Fn(ContextData) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
{
    fn execute(&self, context: &ContextData) -> ActionOutcome {
        ActionOutcome::Pending(Box::pin((self.0)(context.clone())))
    }
}

/// Action that does nothing and succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAction;

impl CommandAction for NoopAction {
    fn execute(&self, _context: &ContextData) -> ActionOutcome {
        ActionOutcome::Done(Ok(()))
    }
}

/// One invocable command.
#[derive(Clone)]
pub struct CommandDescriptor {
    pub(crate) id: String,
    /// Display title; the primary search target.
    pub title: String,
    /// Optional second line; searched by the simple strategy.
    pub description: Option<String>,
    /// Category key.
    pub category: String,
    /// Icon key or raw glyph.
    pub icon: Option<String>,
    /// Key-combo label. Display only; nothing is bound.
    pub shortcut: Option<String>,
    /// Extra terms for the simple strategy.
    pub keywords: Vec<String>,
    pub(crate) action: Arc<dyn CommandAction>,
}

impl CommandDescriptor {
    /// A command with the given id and title, default category and a no-op
    /// action. An empty id is replaced with a generated one on registration.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            category: DEFAULT_CATEGORY.to_string(),
            icon: None,
            shortcut: None,
            keywords: Vec::new(),
            action: Arc::new(NoopAction),
        }
    }

    /// A command without an id; one is generated when it is registered.
    pub fn untitled_id(title: impl Into<String>) -> Self {
        Self::new(String::new(), title)
    }

    /// The registered id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the category key.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the icon.
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set the shortcut label.
    pub fn shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = Some(shortcut.into());
        self
    }

    /// Add search keywords.
    pub fn keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    /// Set the action.
    pub fn action(mut self, action: impl CommandAction) -> Self {
        self.action = Arc::new(action);
        self
    }

    /// Set a synchronous closure as the action.
    pub fn on_run<F>(self, f: F) -> Self
    where
        F: Fn(&ContextData) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.action(FnAction::new(f))
    }

    /// Invoke the action.
    pub fn execute(&self, context: &ContextData) -> ActionOutcome {
        self.action.execute(context)
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("description", &self.description)
            .field("category", &self.category)
            .field("icon", &self.icon)
            .field("shortcut", &self.shortcut)
            .field("keywords", &self.keywords)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn defaults() {
        let cmd = CommandDescriptor::new("open", "Open File");
        assert_eq!(cmd.id(), "open");
        assert_eq!(cmd.category, DEFAULT_CATEGORY);
        assert!(matches!(
            cmd.execute(&ContextData::Null),
            ActionOutcome::Done(Ok(()))
        ));
    }

    #[test]
    fn fn_action_receives_context() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = seen.clone();
        let cmd = CommandDescriptor::new("count", "Count").on_run(move |ctx| {
            let n = ctx["n"].as_u64().unwrap_or(0) as usize;
            seen2.fetch_add(n, Ordering::SeqCst);
            Ok(())
        });
        cmd.execute(&serde_json::json!({ "n": 3 }));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn async_action_is_pending() {
        let cmd = CommandDescriptor::new("later", "Later")
            .action(AsyncAction::new(|_ctx| async { Ok(()) }));
        let outcome = cmd.execute(&ContextData::Null);
        assert!(matches!(outcome, ActionOutcome::Pending(_)));
        if let ActionOutcome::Pending(fut) = outcome {
            assert_eq!(futures::executor::block_on(fut), Ok(()));
        }
    }

    #[test]
    fn debug_skips_action() {
        let text = format!("{:?}", CommandDescriptor::new("a", "Alpha"));
        assert!(text.contains("Alpha"));
        assert!(text.contains(".."));
    }
}
