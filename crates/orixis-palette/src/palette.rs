//! The palette component: one independent overlay instance.
//!
//! A `Palette` owns its command list, query, selection and category filter,
//! and shares only the usage state (recents, favorites, frequency) with other
//! instances. It is `Closed` until [`open`](Palette::open) is called, then
//! handles keys and mouse input until it closes again:
//!
//! ```text
//! Closed --open--> Open --close--> Closing --(animation elapsed)--> Closed
//!                   ^                 |
//!                   +------open-------+
//! ```
//!
//! Lifecycle and execution results are reported as outbound messages
//! ([`Message::Opened`], [`Message::Closed`], [`Message::Executed`],
//! [`Message::ActionFailed`]) that the parent intercepts.
//!
//! # Example
//!
//! ```ignore
//! let usage = UsageStore::load(MemoryStore::new()).shared();
//! let mut palette = Palette::new(PaletteConfig::default(), commands, usage)?;
//! let cmd = palette.open();
//! // In the parent's update():
//! //   AppMsg::Palette(palette::Message::Executed(id)) => { ... }
//! //   AppMsg::Palette(m) => self.palette.update(m).map(AppMsg::Palette),
//! ```

use crate::commands::CommandList;
use crate::config::{PaletteConfig, PaletteStyle, PendingPolicy};
use crate::descriptor::{ActionOutcome, CommandDescriptor, ContextData};
use crate::error::{ActionError, PaletteError};
use crate::ranking::{group_by_category, search, CategoryFilter, Ranked, SearchOptions};
use crate::render::{palette_area, render_view, HitMap, HitTarget};
use crate::usage::{self, SharedUsage};
use crate::view::{self, build_view, ViewState, ViewTree};
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use futures::future::{abortable, AbortHandle};
use futures::FutureExt;
use orixis_core::{Command, Component};
use ratatui::layout::Rect;
use ratatui::Frame;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

/// Overlay lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Not shown; input is ignored apart from the global shortcut.
    Closed,
    /// Shown and interactive.
    Open,
    /// Closing transition running; input is ignored.
    Closing,
}

/// Messages handled and emitted by [`Palette`].
#[derive(Debug, Clone)]
pub enum Message {
    /// A key press while the palette is shown.
    KeyPress(KeyEvent),
    /// A mouse event while the palette is shown.
    Mouse(MouseEvent),
    /// Open the overlay.
    Open,
    /// Close the overlay.
    Close,
    /// Open when closed, close when open.
    Toggle,
    /// The closing transition started at this generation has elapsed.
    CloseFinished(u64),
    /// A pending action settled.
    ActionSettled {
        /// Execution number handed out when the action started.
        execution: u64,
        /// Command id.
        id: String,
        /// How the action ended.
        result: Result<(), ActionError>,
        /// Whether the action was started in the background.
        background: bool,
    },
    /// Emitted after the overlay opened.
    Opened,
    /// Emitted after the overlay finished closing.
    Closed,
    /// Emitted after a command action completed successfully.
    Executed(String),
    /// Emitted when a command action failed, panicked or was cancelled.
    ActionFailed {
        /// Command id.
        id: String,
        /// What went wrong.
        error: ActionError,
    },
}

struct PendingAction {
    id: String,
    abort: AbortHandle,
    // Generation of the open session that started it.
    generation: u64,
}

/// A command palette instance.
pub struct Palette {
    config: PaletteConfig,
    style: PaletteStyle,
    commands: CommandList,
    usage: SharedUsage,
    filtered: Vec<Ranked>,
    selected: usize,
    query: String,
    category: CategoryFilter,
    visibility: Visibility,
    context: ContextData,
    breadcrumbs: Vec<String>,
    // Bumped on every open and close so a stale `CloseFinished` is ignored.
    generation: u64,
    next_execution: u64,
    pending: HashMap<u64, PendingAction>,
    hits: RefCell<HitMap>,
}

impl Palette {
    /// Create a closed palette.
    ///
    /// Fails when the configuration is invalid, when `commands` is empty and
    /// `allow_empty` is off, or on a duplicate id under
    /// [`DuplicatePolicy::Reject`](crate::config::DuplicatePolicy::Reject).
    pub fn new(
        config: PaletteConfig,
        commands: Vec<CommandDescriptor>,
        usage: SharedUsage,
    ) -> Result<Self, PaletteError> {
        config.validate()?;
        if commands.is_empty() && !config.allow_empty {
            return Err(PaletteError::NoCommands);
        }
        let mut list = CommandList::new(config.on_duplicate_id);
        list.set_commands(commands)?;
        Ok(Self {
            style: config.style(),
            config,
            commands: list,
            usage,
            filtered: Vec::new(),
            selected: 0,
            query: String::new(),
            category: CategoryFilter::All,
            visibility: Visibility::Closed,
            context: ContextData::Null,
            breadcrumbs: Vec::new(),
            generation: 0,
            next_execution: 0,
            pending: HashMap::new(),
            hits: RefCell::new(HitMap::default()),
        })
    }

    // --- lifecycle ---

    /// Show the overlay with a fresh query, selection and category.
    /// No-op when already open.
    pub fn open(&mut self) -> Command<Message> {
        if self.visibility == Visibility::Open {
            return Command::none();
        }
        self.generation += 1;
        self.visibility = Visibility::Open;
        self.query.clear();
        self.selected = 0;
        self.category = CategoryFilter::All;
        self.refresh();
        tracing::debug!(results = self.filtered.len(), "palette opened");
        Command::message(Message::Opened)
    }

    /// Start the closing transition. No-op unless open.
    pub fn close(&mut self) -> Command<Message> {
        if self.visibility != Visibility::Open {
            return Command::none();
        }
        self.generation += 1;
        self.visibility = Visibility::Closing;
        self.apply_pending_policy();

        let duration = self.config.animation.closing_duration();
        if duration.is_zero() {
            return self.finish_close();
        }
        let generation = self.generation;
        Command::tick(duration, move |_| Message::CloseFinished(generation))
    }

    /// Open when closed or closing, close when open.
    pub fn toggle(&mut self) -> Command<Message> {
        match self.visibility {
            Visibility::Open => self.close(),
            Visibility::Closed | Visibility::Closing => self.open(),
        }
    }

    /// Close at once, skipping the transition. The pending policy still
    /// applies. No-op when closed.
    pub fn force_close(&mut self) -> Command<Message> {
        match self.visibility {
            Visibility::Closed => Command::none(),
            Visibility::Open => {
                self.generation += 1;
                self.apply_pending_policy();
                self.finish_close()
            }
            Visibility::Closing => {
                self.generation += 1;
                self.finish_close()
            }
        }
    }

    /// Open in response to the global shortcut.
    ///
    /// Only a closed palette reacts, so the shortcut never interferes with
    /// typing into an open search box. Returns `None` when the key was not
    /// consumed.
    pub fn handle_global_key(&mut self, key: &KeyEvent) -> Option<Command<Message>> {
        if self.visibility != Visibility::Closed
            || key.kind == KeyEventKind::Release
            || !self.config.keys.open.matches(key)
        {
            return None;
        }
        Some(self.open())
    }

    fn finish_close(&mut self) -> Command<Message> {
        self.visibility = Visibility::Closed;
        self.query.clear();
        self.selected = 0;
        self.category = CategoryFilter::All;
        self.filtered.clear();
        *self.hits.borrow_mut() = HitMap::default();
        tracing::debug!("palette closed");
        Command::message(Message::Closed)
    }

    fn apply_pending_policy(&mut self) {
        if self.config.on_close_while_pending != PendingPolicy::Cancel {
            return;
        }
        for (execution, action) in &self.pending {
            tracing::debug!(execution, id = %action.id, "cancelling pending action");
            action.abort.abort();
        }
    }

    // --- commands and context ---

    /// Replace the command list. Re-runs the search when open.
    pub fn set_commands(&mut self, commands: Vec<CommandDescriptor>) -> Result<(), PaletteError> {
        self.commands.set_commands(commands)?;
        self.refresh_if_open();
        Ok(())
    }

    /// Append a command. Re-runs the search when open.
    pub fn add_command(&mut self, command: CommandDescriptor) -> Result<(), PaletteError> {
        self.commands.add_command(command)?;
        self.refresh_if_open();
        Ok(())
    }

    /// Remove a command by id. Re-runs the search when open.
    pub fn remove_command(&mut self, id: &str) -> Option<CommandDescriptor> {
        let removed = self.commands.remove_command(id);
        if removed.is_some() {
            self.refresh_if_open();
        }
        removed
    }

    /// Payload handed to every action from now on.
    pub fn set_context(&mut self, context: ContextData) {
        self.context = context;
    }

    /// Current action payload.
    pub fn context(&self) -> &ContextData {
        &self.context
    }

    /// Navigation trail shown above the results. Empty hides the region.
    pub fn set_breadcrumbs(&mut self, trail: Vec<String>) {
        self.breadcrumbs = trail;
    }

    // --- state accessors ---

    /// Lifecycle state.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the overlay is open and interactive.
    pub fn is_open(&self) -> bool {
        self.visibility == Visibility::Open
    }

    /// Current query.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Selected flat index into [`filtered`](Palette::filtered).
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Active category filter.
    pub fn active_category(&self) -> &CategoryFilter {
        &self.category
    }

    /// Results in display order.
    pub fn filtered(&self) -> &[Ranked] {
        &self.filtered
    }

    /// Ids of the results in display order.
    pub fn filtered_ids(&self) -> Vec<&str> {
        self.filtered.iter().map(|r| r.id.as_str()).collect()
    }

    /// Registered commands in insertion order.
    pub fn commands(&self) -> &[CommandDescriptor] {
        self.commands.as_slice()
    }

    /// Configuration.
    pub fn config(&self) -> &PaletteConfig {
        &self.config
    }

    /// Actions started and not yet settled.
    pub fn pending_actions(&self) -> usize {
        self.pending.len()
    }

    /// Clickable zones from the last render.
    pub fn hit_map(&self) -> HitMap {
        self.hits.borrow().clone()
    }

    /// Build the view description for the current state.
    pub fn view_tree(&self) -> ViewTree {
        let usage = usage::lock(&self.usage);
        let state = ViewState {
            commands: self.commands.as_slice(),
            filtered: &self.filtered,
            selected: self.selected,
            query: &self.query,
            category: &self.category,
            usage: &usage,
            breadcrumbs: &self.breadcrumbs,
        };
        build_view(&self.config, &state)
    }

    // --- in-overlay mutations ---

    /// Replace the query and re-run the search. Selection returns to the top.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.selected = 0;
        self.refresh();
    }

    /// Switch the category filter and re-run the search.
    pub fn set_category(&mut self, category: CategoryFilter) {
        self.category = category;
        self.selected = 0;
        self.refresh();
    }

    /// Move the selection by `delta`, clamped to the result list.
    pub fn move_selection(&mut self, delta: isize) {
        let Some(last) = self.filtered.len().checked_sub(1) else {
            self.selected = 0;
            return;
        };
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }

    /// Select the first result.
    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    /// Select the last result.
    pub fn select_last(&mut self) {
        self.selected = self.filtered.len().saturating_sub(1);
    }

    /// Step through the sidebar filters, wrapping at the ends.
    pub fn cycle_category(&mut self, forward: bool) {
        let filters = view::category_filters(&self.config, self.commands.as_slice());
        let current = filters.iter().position(|f| *f == self.category).unwrap_or(0);
        let n = filters.len();
        let next = if forward {
            (current + 1) % n
        } else {
            (current + n - 1) % n
        };
        self.set_category(filters[next].clone());
    }

    /// Flip the favorite flag of the selected command.
    pub fn toggle_favorite_selected(&mut self) {
        if let Some(id) = self.filtered.get(self.selected).map(|r| r.id.clone()) {
            self.toggle_favorite(&id);
        }
    }

    fn toggle_favorite(&mut self, id: &str) {
        if !self.config.features.favorites {
            return;
        }
        usage::lock(&self.usage).toggle_favorite(id);
        self.refresh();
    }

    // --- execution ---

    /// Execute the selected command. `background` keeps the overlay open.
    pub fn execute_selected(&mut self, background: bool) -> Command<Message> {
        match self.filtered.get(self.selected).map(|r| r.id.clone()) {
            Some(id) => self.execute(&id, background),
            None => Command::none(),
        }
    }

    /// Execute a command by id.
    ///
    /// Usage is recorded before the action runs. A synchronous success emits
    /// [`Message::Executed`] and closes (unless `background`); a pending
    /// action keeps the overlay open until it settles. Failures and panics
    /// emit [`Message::ActionFailed`] and leave the overlay open.
    pub fn execute(&mut self, id: &str, background: bool) -> Command<Message> {
        let Some(command) = self.commands.get(id).cloned() else {
            return Command::none();
        };
        usage::lock(&self.usage).record_execution(id);
        tracing::debug!(id, background, "executing command");

        let context = &self.context;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| command.execute(context)));
        match outcome {
            Ok(ActionOutcome::Done(result)) => self.settle(id.to_string(), result, background),
            Err(payload) => self.settle(
                id.to_string(),
                Err(ActionError::Panicked(panic_message(&*payload))),
                background,
            ),
            Ok(ActionOutcome::Pending(future)) => {
                let execution = self.next_execution;
                self.next_execution += 1;
                let (future, abort) = abortable(AssertUnwindSafe(future).catch_unwind());
                self.pending.insert(
                    execution,
                    PendingAction {
                        id: id.to_string(),
                        abort,
                        generation: self.generation,
                    },
                );
                let id = id.to_string();
                Command::perform(future, move |settled| {
                    let result = match settled {
                        Ok(Ok(result)) => result,
                        Ok(Err(payload)) => Err(ActionError::Panicked(panic_message(&*payload))),
                        Err(_aborted) => Err(ActionError::Cancelled),
                    };
                    Message::ActionSettled {
                        execution,
                        id,
                        result,
                        background,
                    }
                })
            }
        }
    }

    fn settle(&mut self, id: String, result: Result<(), ActionError>, background: bool) -> Command<Message> {
        match result {
            Ok(()) => {
                tracing::debug!(id = %id, "command executed");
                let close = if background {
                    Command::none()
                } else {
                    self.close()
                };
                Command::batch([Command::message(Message::Executed(id)), close])
            }
            Err(error) => {
                tracing::error!(id = %id, %error, "command action failed");
                Command::message(Message::ActionFailed { id, error })
            }
        }
    }

    // --- input ---

    fn handle_key(&mut self, key: KeyEvent) -> Command<Message> {
        if self.visibility != Visibility::Open || key.kind == KeyEventKind::Release {
            return Command::none();
        }
        let keys = &self.config.keys;
        if keys.close.matches(&key) {
            return self.close();
        }
        if keys.execute_background.matches(&key) {
            return self.execute_selected(true);
        }
        if keys.execute.matches(&key) {
            return self.execute_selected(false);
        }

        let page = self.config.page_size as isize;
        if keys.up.matches(&key) {
            self.move_selection(-1);
        } else if keys.down.matches(&key) {
            self.move_selection(1);
        } else if keys.first.matches(&key) {
            self.select_first();
        } else if keys.last.matches(&key) {
            self.select_last();
        } else if keys.page_up.matches(&key) {
            self.move_selection(-page);
        } else if keys.page_down.matches(&key) {
            self.move_selection(page);
        } else if keys.next_category.matches(&key) {
            if self.config.features.categories {
                self.cycle_category(true);
            }
        } else if keys.prev_category.matches(&key) {
            if self.config.features.categories {
                self.cycle_category(false);
            }
        } else if keys.toggle_favorite.matches(&key) {
            self.toggle_favorite_selected();
        } else if keys.clear.matches(&key) {
            self.set_query(String::new());
        } else {
            match key.code {
                KeyCode::Backspace => {
                    let mut query = std::mem::take(&mut self.query);
                    if query.pop().is_some() {
                        self.set_query(query);
                    }
                }
                KeyCode::Char(c)
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                {
                    let mut query = std::mem::take(&mut self.query);
                    query.push(c);
                    self.set_query(query);
                }
                _ => {}
            }
        }
        Command::none()
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Command<Message> {
        if self.visibility != Visibility::Open {
            return Command::none();
        }
        match event.kind {
            MouseEventKind::ScrollDown => self.move_selection(1),
            MouseEventKind::ScrollUp => self.move_selection(-1),
            MouseEventKind::Down(MouseButton::Left) => {
                let hits = self.hit_map();
                if !hits.inside(event.column, event.row) {
                    return self.close();
                }
                match hits.hit(event.column, event.row) {
                    Some(HitTarget::Row(index)) => {
                        self.selected = *index;
                        return self.execute_selected(false);
                    }
                    Some(HitTarget::Favorite(index)) => {
                        if let Some(id) = self.filtered.get(*index).map(|r| r.id.clone()) {
                            self.toggle_favorite(&id);
                        }
                    }
                    Some(HitTarget::Category(filter)) => self.set_category(filter.clone()),
                    Some(HitTarget::Clear) => self.set_query(String::new()),
                    None => {}
                }
            }
            _ => {}
        }
        Command::none()
    }

    fn refresh_if_open(&mut self) {
        if self.visibility == Visibility::Open {
            self.refresh();
        }
    }

    fn refresh(&mut self) {
        let commands = self.commands.as_slice();
        let mut filtered = {
            let usage = usage::lock(&self.usage);
            search(
                commands,
                &self.query,
                &self.category,
                &usage,
                &SearchOptions::from(&self.config),
            )
        };
        if view::is_grouped(&self.config, &self.category) {
            filtered = group_by_category(filtered, commands);
        }
        self.filtered = filtered;
        self.selected = self.selected.min(self.filtered.len().saturating_sub(1));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl Component for Palette {
    type Message = Message;

    fn update(&mut self, msg: Message) -> Command<Message> {
        match msg {
            Message::KeyPress(key) => self.handle_key(key),
            Message::Mouse(event) => self.handle_mouse(event),
            Message::Open => self.open(),
            Message::Close => self.close(),
            Message::Toggle => self.toggle(),
            Message::CloseFinished(generation) => {
                if self.visibility == Visibility::Closing && generation == self.generation {
                    self.finish_close()
                } else {
                    Command::none()
                }
            }
            Message::ActionSettled {
                execution,
                id,
                result,
                background,
            } => {
                let same_session = self
                    .pending
                    .remove(&execution)
                    .is_some_and(|action| action.generation == self.generation);
                let cancelled = result == Err(ActionError::Cancelled);
                if result.is_ok() && (self.visibility != Visibility::Open || !same_session) {
                    // Detached: report it, but leave whatever session is open now alone.
                    tracing::debug!(id = %id, "detached command finished");
                    return Command::message(Message::Executed(id));
                }
                if cancelled {
                    tracing::debug!(id = %id, "pending action cancelled");
                    return Command::message(Message::ActionFailed {
                        id,
                        error: ActionError::Cancelled,
                    });
                }
                self.settle(id, result, background)
            }
            Message::Opened | Message::Closed | Message::Executed(_) | Message::ActionFailed { .. } => {
                Command::none()
            }
        }
    }

    fn view(&self, frame: &mut Frame, area: Rect) {
        if self.visibility == Visibility::Closed {
            return;
        }
        let tree = self.view_tree();
        let overlay: Rect = palette_area(self.config.size, area);
        let hits = render_view(
            &tree,
            &self.style,
            self.visibility == Visibility::Closing,
            frame,
            overlay,
        );
        *self.hits.borrow_mut() = hits;
    }

    fn focused(&self) -> bool {
        self.is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Animation, Features};
    use crate::descriptor::AsyncAction;
    use crate::store::MemoryStore;
    use crate::usage::UsageStore;
    use orixis_core::testing::ComponentHarness;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn key(code: KeyCode) -> Message {
        Message::KeyPress(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> Message {
        Message::KeyPress(KeyEvent::new(code, modifiers))
    }

    fn typed(h: &mut ComponentHarness<Palette>, text: &str) {
        for c in text.chars() {
            h.send(key(KeyCode::Char(c)));
        }
    }

    fn flat_config() -> PaletteConfig {
        PaletteConfig::default()
            .with_animation(Animation::None)
            .with_features(Features {
                categories: false,
                ..Features::default()
            })
    }

    fn sample() -> Vec<CommandDescriptor> {
        vec![
            CommandDescriptor::new("a", "Open File"),
            CommandDescriptor::new("b", "Open Folder"),
            CommandDescriptor::new("c", "Close File"),
        ]
    }

    fn palette_with(config: PaletteConfig, commands: Vec<CommandDescriptor>) -> Palette {
        let usage = UsageStore::load(MemoryStore::new()).shared();
        Palette::new(config, commands, usage).unwrap()
    }

    fn harness(commands: Vec<CommandDescriptor>) -> ComponentHarness<Palette> {
        ComponentHarness::new(palette_with(flat_config(), commands))
    }

    fn executed(h: &ComponentHarness<Palette>) -> Vec<String> {
        h.delivered()
            .iter()
            .filter_map(|m| match m {
                Message::Executed(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    fn failures(h: &ComponentHarness<Palette>) -> Vec<ActionError> {
        h.delivered()
            .iter()
            .filter_map(|m| match m {
                Message::ActionFailed { error, .. } => Some(error.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn toggle_opens_with_fresh_state_then_closes() {
        let mut h = harness(sample());
        assert_eq!(h.component().visibility(), Visibility::Closed);

        h.send(Message::Toggle);
        let p = h.component();
        assert!(p.is_open());
        assert_eq!(p.query(), "");
        assert_eq!(p.selected_index(), 0);
        assert_eq!(*p.active_category(), CategoryFilter::All);
        assert!(matches!(h.delivered(), [Message::Opened]));

        h.send(Message::Toggle);
        assert_eq!(h.component().visibility(), Visibility::Closed);
        assert!(matches!(h.delivered().last(), Some(Message::Closed)));
    }

    #[test]
    fn reopening_resets_query_and_selection() {
        let mut h = harness(sample());
        h.send(Message::Open);
        typed(&mut h, "open");
        h.send(key(KeyCode::Down));
        assert_eq!(h.component().selected_index(), 1);
        h.send(Message::Close);
        h.send(Message::Open);
        assert_eq!(h.component().query(), "");
        assert_eq!(h.component().selected_index(), 0);
    }

    #[test]
    fn close_and_destroy_style_calls_are_idempotent() {
        let mut h = harness(sample());
        h.send(Message::Close);
        assert!(h.delivered().is_empty());
        h.send(Message::Open);
        h.send(Message::Open);
        assert_eq!(
            h.delivered()
                .iter()
                .filter(|m| matches!(m, Message::Opened))
                .count(),
            1
        );
        assert_eq!(h.component_mut().force_close().into_messages().len(), 1);
        assert!(h.component_mut().force_close().is_none());
    }

    #[test]
    fn typing_filters_and_ranks() {
        let mut h = harness(sample());
        h.send(Message::Open);
        typed(&mut h, "open");
        assert_eq!(h.component().filtered_ids(), ["a", "b"]);
        h.send(key(KeyCode::Backspace));
        assert_eq!(h.component().query(), "ope");
        h.send(key_with(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(h.component().query(), "");
    }

    #[test]
    fn selection_clamps_at_both_ends() {
        let mut h = harness(sample());
        h.send(Message::Open);
        typed(&mut h, "file");
        let len = h.component().filtered().len();
        assert_eq!(len, 2);
        for _ in 0..10 {
            h.send(key(KeyCode::Down));
            assert!(h.component().selected_index() <= len - 1);
        }
        assert_eq!(h.component().selected_index(), len - 1);
        for _ in 0..10 {
            h.send(key(KeyCode::Up));
        }
        assert_eq!(h.component().selected_index(), 0);
        h.send(key(KeyCode::End));
        assert_eq!(h.component().selected_index(), len - 1);
        h.send(key(KeyCode::Home));
        assert_eq!(h.component().selected_index(), 0);
        h.send(key(KeyCode::PageDown));
        assert_eq!(h.component().selected_index(), len - 1);
    }

    #[test]
    fn selection_stays_zero_on_empty_results() {
        let mut h = harness(sample());
        h.send(Message::Open);
        typed(&mut h, "zzz");
        h.send(key(KeyCode::Down));
        assert_eq!(h.component().selected_index(), 0);
        h.send(key(KeyCode::Enter));
        assert!(h.component().is_open());
    }

    #[test]
    fn enter_executes_records_usage_and_closes() {
        let runs = Arc::new(AtomicUsize::new(0));
        let seen = runs.clone();
        let mut h = harness(vec![
            CommandDescriptor::new("a", "Alpha").on_run(move |ctx| {
                assert_eq!(ctx["user"], "ana");
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            CommandDescriptor::new("b", "Beta"),
        ]);
        h.component_mut()
            .set_context(serde_json::json!({ "user": "ana" }));
        h.send(Message::Open);
        typed(&mut h, "alpha");
        h.send(key(KeyCode::Enter));

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(executed(&h), ["a"]);
        assert_eq!(h.component().visibility(), Visibility::Closed);

        // Recents now list "a" on an empty query.
        h.send(Message::Open);
        assert_eq!(h.component().filtered_ids(), ["a"]);
    }

    #[test]
    fn recents_deduplicate_through_execution() {
        let mut h = harness(sample());
        for id in ["a", "b", "a"] {
            h.send(Message::Open);
            let cmd = h.component_mut().execute(id, false);
            h.run(cmd);
        }
        h.send(Message::Open);
        assert_eq!(h.component().filtered_ids(), ["a", "b"]);
    }

    #[test]
    fn background_execution_keeps_overlay_open() {
        let mut h = harness(sample());
        h.send(Message::Open);
        typed(&mut h, "folder");
        h.send(key_with(KeyCode::Enter, KeyModifiers::ALT));
        assert!(h.component().is_open());
        assert_eq!(executed(&h), ["b"]);
    }

    #[test]
    fn pending_action_defers_close_until_settled() {
        let mut h = harness(vec![CommandDescriptor::new("slow", "Slow")
            .action(AsyncAction::new(|_ctx| async { Ok(()) }))]);
        h.send(Message::Open);
        typed(&mut h, "slow");
        h.send(key(KeyCode::Enter));

        assert!(h.component().is_open());
        assert_eq!(h.component().pending_actions(), 1);
        assert!(executed(&h).is_empty());

        h.settle();
        assert_eq!(h.component().visibility(), Visibility::Closed);
        assert_eq!(h.component().pending_actions(), 0);
        assert_eq!(executed(&h), ["slow"]);
    }

    #[test]
    fn pending_background_action_never_closes() {
        let mut h = harness(vec![CommandDescriptor::new("slow", "Slow")
            .action(AsyncAction::new(|_ctx| async { Ok(()) }))]);
        h.send(Message::Open);
        typed(&mut h, "slow");
        h.send(key_with(KeyCode::Enter, KeyModifiers::CONTROL));
        h.settle();
        assert!(h.component().is_open());
        assert_eq!(executed(&h), ["slow"]);
    }

    #[test]
    fn failing_action_stays_open_and_reports() {
        let mut h = harness(vec![
            CommandDescriptor::new("bad", "Bad").on_run(|_| Err(ActionError::failed("boom"))),
            CommandDescriptor::new("rejects", "Rejects").action(AsyncAction::new(|_ctx| async {
                Err(ActionError::failed("later"))
            })),
        ]);
        h.send(Message::Open);
        typed(&mut h, "bad");
        h.send(key(KeyCode::Enter));
        assert!(h.component().is_open());
        assert_eq!(failures(&h), [ActionError::failed("boom")]);

        h.send(key_with(KeyCode::Char('u'), KeyModifiers::CONTROL));
        typed(&mut h, "rejects");
        h.send(key(KeyCode::Enter));
        h.settle();
        assert!(h.component().is_open());
        assert_eq!(failures(&h).last(), Some(&ActionError::failed("later")));
        assert!(executed(&h).is_empty());
    }

    #[test]
    fn panicking_action_is_caught() {
        let mut h = harness(vec![
            CommandDescriptor::new("p", "Panics").on_run(|_| panic!("kaboom"))
        ]);
        h.send(Message::Open);
        typed(&mut h, "panics");
        h.send(key(KeyCode::Enter));
        assert!(h.component().is_open());
        assert_eq!(failures(&h), [ActionError::Panicked("kaboom".into())]);
    }

    #[test]
    fn cancel_policy_aborts_pending_action_on_close() {
        let config = flat_config().with_pending_policy(PendingPolicy::Cancel);
        let mut h = ComponentHarness::new(palette_with(
            config,
            vec![CommandDescriptor::new("hang", "Hang")
                .action(AsyncAction::new(|_ctx| futures::future::pending()))],
        ));
        h.send(Message::Open);
        typed(&mut h, "hang");
        h.send(key(KeyCode::Enter));
        h.send(key(KeyCode::Esc));
        assert_eq!(h.component().visibility(), Visibility::Closed);

        h.settle();
        assert_eq!(failures(&h), [ActionError::Cancelled]);
        assert_eq!(h.component().pending_actions(), 0);
        assert!(executed(&h).is_empty());
    }

    #[test]
    fn detach_policy_lets_pending_action_finish() {
        let mut h = harness(vec![CommandDescriptor::new("slow", "Slow")
            .action(AsyncAction::new(|_ctx| async { Ok(()) }))]);
        h.send(Message::Open);
        typed(&mut h, "slow");
        h.send(key(KeyCode::Enter));
        h.send(key(KeyCode::Esc));
        assert_eq!(h.component().visibility(), Visibility::Closed);
        h.settle();
        assert_eq!(executed(&h), ["slow"]);
        assert_eq!(h.component().visibility(), Visibility::Closed);
    }

    #[test]
    fn closing_animation_waits_for_timer() {
        let config = flat_config().with_animation(Animation::Fade);
        let mut h = ComponentHarness::new(palette_with(config, sample()));
        h.send(Message::Open);
        h.send(Message::Close);
        assert_eq!(h.component().visibility(), Visibility::Closing);
        assert_eq!(h.pending_futures(), 1);
        h.send(key(KeyCode::Char('x')));
        assert_eq!(h.component().query(), "");
        h.settle();
        assert_eq!(h.component().visibility(), Visibility::Closed);
        assert!(matches!(h.delivered().last(), Some(Message::Closed)));
    }

    #[test]
    fn stale_close_timer_is_ignored_after_reopen() {
        let config = flat_config().with_animation(Animation::Fade);
        let mut h = ComponentHarness::new(palette_with(config, sample()));
        h.send(Message::Open);
        h.send(Message::Close);
        h.send(Message::Open);
        h.settle();
        assert!(h.component().is_open());
    }

    #[test]
    fn global_key_only_opens_closed_palette() {
        let mut p = palette_with(flat_config(), sample());
        let ctrl_k = KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL);
        let other = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CONTROL);
        assert!(p.handle_global_key(&other).is_none());
        assert!(p.handle_global_key(&ctrl_k).is_some());
        assert!(p.is_open());
        assert!(p.handle_global_key(&ctrl_k).is_none());
    }

    #[test]
    fn favorites_toggle_and_view() {
        let config = PaletteConfig::default().with_animation(Animation::None);
        let mut h = ComponentHarness::new(palette_with(config, sample()));
        h.send(Message::Open);
        typed(&mut h, "folder");
        h.send(key_with(KeyCode::Char('f'), KeyModifiers::CONTROL));

        h.component_mut().set_category(CategoryFilter::Favorites);
        for query in ["", "open", "close"] {
            h.component_mut().set_query(query);
            assert_eq!(h.component().filtered_ids(), ["b"], "query {query:?}");
        }
    }

    #[test]
    fn tab_cycles_categories() {
        let config = PaletteConfig::default().with_animation(Animation::None);
        let commands = vec![
            CommandDescriptor::new("a", "Open File").category("files"),
            CommandDescriptor::new("b", "Preferences").category("settings"),
        ];
        let mut h = ComponentHarness::new(palette_with(config, commands));
        h.send(Message::Open);
        h.send(key(KeyCode::Tab));
        assert_eq!(*h.component().active_category(), CategoryFilter::Favorites);
        h.send(key(KeyCode::Tab));
        h.send(key(KeyCode::Tab));
        assert_eq!(
            *h.component().active_category(),
            CategoryFilter::Named("files".into())
        );
        assert_eq!(h.component().filtered_ids(), ["a"]);
        h.send(key(KeyCode::BackTab));
        assert_eq!(*h.component().active_category(), CategoryFilter::Recent);
    }

    #[test]
    fn grouped_results_keep_selection_in_display_order() {
        let config = PaletteConfig::default().with_animation(Animation::None);
        let commands = vec![
            CommandDescriptor::new("a", "Open File").category("files"),
            CommandDescriptor::new("b", "Open Settings").category("settings"),
            CommandDescriptor::new("c", "Open Recent").category("files"),
        ];
        let mut h = ComponentHarness::new(palette_with(config, commands));
        h.send(Message::Open);
        typed(&mut h, "open");
        assert_eq!(h.component().filtered_ids(), ["a", "c", "b"]);
        h.send(key(KeyCode::Down));
        h.send(key(KeyCode::Enter));
        assert_eq!(executed(&h), ["c"]);
    }

    #[test]
    fn command_list_changes_refresh_open_palette() {
        let mut h = harness(sample());
        h.send(Message::Open);
        typed(&mut h, "open");
        h.send(key(KeyCode::End));
        assert_eq!(h.component().selected_index(), 1);

        h.component_mut().remove_command("b");
        assert_eq!(h.component().filtered_ids(), ["a"]);
        assert_eq!(h.component().selected_index(), 0);

        h.component_mut()
            .add_command(CommandDescriptor::untitled_id("Open Terminal"))
            .unwrap();
        assert_eq!(h.component().filtered_ids(), ["a", "cmd-2"]);

        h.component_mut()
            .set_commands(vec![CommandDescriptor::new("z", "Open Zen")])
            .unwrap();
        assert_eq!(h.component().filtered_ids(), ["z"]);
    }

    #[test]
    fn creation_validates_inputs() {
        let usage = UsageStore::load(MemoryStore::new()).shared();
        assert_eq!(
            Palette::new(PaletteConfig::default(), Vec::new(), usage.clone()).err(),
            Some(PaletteError::NoCommands)
        );
        assert!(Palette::new(
            PaletteConfig::default().with_allow_empty(true),
            Vec::new(),
            usage.clone()
        )
        .is_ok());
        assert!(matches!(
            Palette::new(PaletteConfig::default().with_max_results(0), sample(), usage),
            Err(PaletteError::InvalidConfig(_))
        ));
    }

    #[test]
    fn mouse_clicks_hit_rows_favorites_and_backdrop() {
        let mut h = harness(sample());
        h.send(Message::Open);
        typed(&mut h, "open");
        h.render(100, 30);
        let hits = h.component().hit_map();

        let star = hits.locate(&HitTarget::Favorite(1)).unwrap();
        h.send(Message::Mouse(click(star.x, star.y)));
        assert!(h.component().is_open());
        assert!(executed(&h).is_empty());
        assert!(usage::lock(&h.component().usage).is_favorite("b"));

        h.render(100, 30);
        let row = h.component().hit_map().locate(&HitTarget::Row(0)).unwrap();
        h.send(Message::Mouse(click(row.x + 4, row.y)));
        assert_eq!(executed(&h), ["a"]);
        assert_eq!(h.component().visibility(), Visibility::Closed);

        h.send(Message::Open);
        h.render(100, 30);
        h.send(Message::Mouse(click(0, 0)));
        assert_eq!(h.component().visibility(), Visibility::Closed);
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn renders_nothing_when_closed() {
        let mut h = harness(sample());
        assert!(h.render_string(60, 12).trim().is_empty());
        h.send(Message::Open);
        assert!(h.render_string(60, 12).contains("Commands"));
    }
}
