//! Tracks every palette instance in the process.
//!
//! A [`RegistryService`] is built once at startup and handed to whatever
//! needs to create or drive palettes. It owns the instances, the usage state
//! they share, and the routing of terminal input: keys go to the most
//! recently opened instance that is still open, and when none is open the
//! global shortcut opens the designated one.

use crate::config::PaletteConfig;
use crate::descriptor::{CommandDescriptor, ContextData};
use crate::error::PaletteError;
use crate::palette::{Message, Palette, Visibility};
use crate::store::{KeyValueStore, MemoryStore};
use crate::usage::{SharedUsage, UsageStore};
use crossterm::event::{KeyEvent, MouseEvent};
use orixis_core::{Command, Component};
use ratatui::layout::Rect;
use ratatui::Frame;
use std::collections::BTreeMap;
use std::fmt;

/// Opaque handle of one palette instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "palette-{}", self.0)
    }
}

/// Messages handled by [`RegistryService`].
#[derive(Debug, Clone)]
pub enum RegistryMessage {
    /// A terminal key press, routed to the focused instance.
    Key(KeyEvent),
    /// A terminal mouse event, routed to the topmost shown instance.
    Mouse(MouseEvent),
    /// A message for, or emitted by, one instance.
    Instance {
        /// Target or source instance.
        id: InstanceId,
        /// The palette message.
        msg: Message,
    },
}

/// Owner of all palette instances and their shared usage state.
pub struct RegistryService {
    usage: SharedUsage,
    instances: BTreeMap<InstanceId, Palette>,
    // Instances in the order they were last opened; the last shown one is on top.
    stack: Vec<InstanceId>,
    designated: Option<InstanceId>,
    next_id: u64,
}

impl RegistryService {
    /// Load usage state from `store` once and start with no instances.
    pub fn new(store: impl KeyValueStore) -> Self {
        Self {
            usage: UsageStore::load(store).shared(),
            instances: BTreeMap::new(),
            stack: Vec::new(),
            designated: None,
            next_id: 1,
        }
    }

    /// A registry whose usage state lives only in memory.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// The usage state shared by every instance.
    pub fn usage(&self) -> &SharedUsage {
        &self.usage
    }

    /// Create a closed instance. The first instance created becomes the
    /// target of the global shortcut.
    pub fn create(
        &mut self,
        config: PaletteConfig,
        commands: Vec<CommandDescriptor>,
    ) -> Result<InstanceId, PaletteError> {
        let palette = Palette::new(config, commands, self.usage.clone())?;
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        self.instances.insert(id, palette);
        if self.designated.is_none() {
            self.designated = Some(id);
        }
        tracing::debug!(%id, "palette created");
        Ok(id)
    }

    /// Choose which instance the global shortcut opens. Returns `false` for
    /// an unknown id.
    pub fn designate(&mut self, id: InstanceId) -> bool {
        if !self.instances.contains_key(&id) {
            return false;
        }
        self.designated = Some(id);
        true
    }

    /// The instance the global shortcut opens.
    pub fn designated(&self) -> Option<InstanceId> {
        self.designated
    }

    /// Look up an instance.
    pub fn get(&self, id: InstanceId) -> Option<&Palette> {
        self.instances.get(&id)
    }

    /// Look up an instance mutably.
    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut Palette> {
        self.instances.get_mut(&id)
    }

    /// Live instance ids in creation order.
    pub fn ids(&self) -> Vec<InstanceId> {
        self.instances.keys().copied().collect()
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no instance is live.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Open an instance. Unknown ids are ignored.
    pub fn open(&mut self, id: InstanceId) -> Command<RegistryMessage> {
        self.with_instance(id, Palette::open)
    }

    /// Close an instance. Unknown ids are ignored.
    pub fn close(&mut self, id: InstanceId) -> Command<RegistryMessage> {
        self.with_instance(id, Palette::close)
    }

    /// Toggle an instance. Unknown ids are ignored.
    pub fn toggle(&mut self, id: InstanceId) -> Command<RegistryMessage> {
        self.with_instance(id, Palette::toggle)
    }

    /// Replace an instance's commands. Unknown ids are ignored.
    pub fn set_commands(
        &mut self,
        id: InstanceId,
        commands: Vec<CommandDescriptor>,
    ) -> Result<(), PaletteError> {
        match self.instances.get_mut(&id) {
            Some(palette) => palette.set_commands(commands),
            None => Ok(()),
        }
    }

    /// Append a command to an instance. Unknown ids are ignored.
    pub fn add_command(&mut self, id: InstanceId, command: CommandDescriptor) -> Result<(), PaletteError> {
        match self.instances.get_mut(&id) {
            Some(palette) => palette.add_command(command),
            None => Ok(()),
        }
    }

    /// Remove a command from an instance.
    pub fn remove_command(&mut self, id: InstanceId, command_id: &str) -> Option<CommandDescriptor> {
        self.instances.get_mut(&id)?.remove_command(command_id)
    }

    /// Set the payload handed to an instance's actions.
    pub fn set_context(&mut self, id: InstanceId, context: ContextData) {
        if let Some(palette) = self.instances.get_mut(&id) {
            palette.set_context(context);
        }
    }

    /// Close an instance without its transition and forget it. Repeated
    /// calls are no-ops.
    pub fn destroy(&mut self, id: InstanceId) -> Command<RegistryMessage> {
        let Some(mut palette) = self.instances.remove(&id) else {
            return Command::none();
        };
        self.stack.retain(|s| *s != id);
        if self.designated == Some(id) {
            self.designated = None;
        }
        tracing::debug!(%id, "palette destroyed");
        lift(id, palette.force_close())
    }

    fn with_instance(
        &mut self,
        id: InstanceId,
        f: impl FnOnce(&mut Palette) -> Command<Message>,
    ) -> Command<RegistryMessage> {
        let Some(palette) = self.instances.get_mut(&id) else {
            return Command::none();
        };
        let was_open = palette.is_open();
        let cmd = f(palette);
        if !was_open && palette.is_open() {
            self.stack.retain(|s| *s != id);
            self.stack.push(id);
        }
        lift(id, cmd)
    }

    // Topmost instance in the given states.
    fn topmost(&self, shown: &[Visibility]) -> Option<InstanceId> {
        self.stack.iter().rev().copied().find(|id| {
            self.instances
                .get(id)
                .is_some_and(|p| shown.contains(&p.visibility()))
        })
    }

    /// The instance currently receiving keys.
    pub fn focused_instance(&self) -> Option<InstanceId> {
        self.topmost(&[Visibility::Open])
    }
}

fn lift(id: InstanceId, cmd: Command<Message>) -> Command<RegistryMessage> {
    cmd.map(move |msg| RegistryMessage::Instance { id, msg })
}

impl Component for RegistryService {
    type Message = RegistryMessage;

    fn update(&mut self, msg: RegistryMessage) -> Command<RegistryMessage> {
        match msg {
            RegistryMessage::Key(key) => {
                if let Some(id) = self.focused_instance() {
                    return self.with_instance(id, |p| p.update(Message::KeyPress(key)));
                }
                let Some(id) = self.designated else {
                    return Command::none();
                };
                self.with_instance(id, |p| p.handle_global_key(&key).unwrap_or_else(Command::none))
            }
            RegistryMessage::Mouse(event) => match self.topmost(&[Visibility::Open]) {
                Some(id) => self.with_instance(id, |p| p.update(Message::Mouse(event))),
                None => Command::none(),
            },
            RegistryMessage::Instance { id, msg } => self.with_instance(id, |p| p.update(msg)),
        }
    }

    fn view(&self, frame: &mut Frame, area: Rect) {
        for id in &self.stack {
            if let Some(palette) = self.instances.get(id) {
                palette.view(frame, area);
            }
        }
    }

    fn focused(&self) -> bool {
        self.focused_instance().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Animation;
    use crossterm::event::{KeyCode, KeyModifiers};
    use orixis_core::testing::ComponentHarness;

    fn config() -> PaletteConfig {
        PaletteConfig::default().with_animation(Animation::None)
    }

    fn commands() -> Vec<CommandDescriptor> {
        vec![
            CommandDescriptor::new("a", "Open File"),
            CommandDescriptor::new("b", "Open Folder"),
        ]
    }

    fn key(code: KeyCode) -> RegistryMessage {
        RegistryMessage::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl_k() -> RegistryMessage {
        RegistryMessage::Key(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL))
    }

    #[test]
    fn instance_ids_are_distinct_and_displayable() {
        let mut registry = RegistryService::in_memory();
        let first = registry.create(config(), commands()).unwrap();
        let second = registry.create(config(), commands()).unwrap();
        assert_ne!(first, second);
        assert_eq!(first.to_string(), "palette-1");
        assert_eq!(registry.ids(), [first, second]);
    }

    #[test]
    fn create_reports_configuration_errors() {
        let mut registry = RegistryService::in_memory();
        assert_eq!(
            registry.create(config(), Vec::new()),
            Err(PaletteError::NoCommands)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn instances_do_not_share_query_or_selection() {
        let mut registry = RegistryService::in_memory();
        let first = registry.create(config(), commands()).unwrap();
        let second = registry.create(config(), commands()).unwrap();
        let mut h = ComponentHarness::new(registry);

        let cmd = h.component_mut().open(first);
        h.run(cmd);
        h.send(key(KeyCode::Char('o')));
        h.send(key(KeyCode::Down));

        let cmd = h.component_mut().open(second);
        h.run(cmd);
        assert_eq!(h.component().get(second).unwrap().query(), "");
        assert_eq!(h.component().get(second).unwrap().selected_index(), 0);
        assert_eq!(h.component().get(first).unwrap().query(), "o");
        assert_eq!(h.component().get(first).unwrap().selected_index(), 1);

        // Keys now go to the most recently opened instance.
        h.send(key(KeyCode::Char('x')));
        assert_eq!(h.component().get(second).unwrap().query(), "x");
        assert_eq!(h.component().get(first).unwrap().query(), "o");
    }

    #[test]
    fn usage_is_shared_between_instances() {
        let mut registry = RegistryService::in_memory();
        let first = registry.create(config(), commands()).unwrap();
        let second = registry.create(config(), commands()).unwrap();
        let mut h = ComponentHarness::new(registry);

        let cmd = h.component_mut().open(first);
        h.run(cmd);
        let cmd = h.component_mut().get_mut(first).unwrap().execute("b", false);
        h.run(cmd.map(move |msg| RegistryMessage::Instance { id: first, msg }));
        assert!(!h.component().get(first).unwrap().is_open());

        let cmd = h.component_mut().open(second);
        h.run(cmd);
        assert_eq!(h.component().get(second).unwrap().filtered_ids(), ["b"]);
    }

    #[test]
    fn global_shortcut_opens_designated_instance_only_when_closed() {
        let mut registry = RegistryService::in_memory();
        let first = registry.create(config(), commands()).unwrap();
        let second = registry.create(config(), commands()).unwrap();
        assert!(registry.designate(second));
        let mut h = ComponentHarness::new(registry);

        h.send(ctrl_k());
        assert!(h.component().get(second).unwrap().is_open());
        assert!(!h.component().get(first).unwrap().is_open());

        // While open, Ctrl+K is just a key for the open instance.
        h.send(ctrl_k());
        assert!(h.component().get(second).unwrap().is_open());
        assert_eq!(h.component().get(second).unwrap().query(), "");

        h.send(key(KeyCode::Esc));
        assert!(!h.component().get(second).unwrap().is_open());
        assert_eq!(h.component().focused_instance(), None);
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut registry = RegistryService::in_memory();
        let id = registry.create(config(), commands()).unwrap();
        let opened = registry.open(id);
        assert!(!opened.is_none());
        let closed = registry.destroy(id);
        assert_eq!(closed.into_messages().len(), 1);
        assert!(registry.get(id).is_none());
        assert!(registry.destroy(id).is_none());
        assert!(registry.open(id).is_none());
        assert!(registry.designated().is_none());
        assert!(!registry.designate(id));
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut registry = RegistryService::in_memory();
        let id = registry.create(config(), commands()).unwrap();
        registry.destroy(id);
        assert!(registry.set_commands(id, commands()).is_ok());
        assert!(registry
            .add_command(id, CommandDescriptor::new("c", "C"))
            .is_ok());
        assert!(registry.remove_command(id, "a").is_none());
        registry.set_context(id, ContextData::Null);
        assert!(registry.toggle(id).is_none());
        assert!(registry.close(id).is_none());
    }

    #[test]
    fn context_reaches_actions() {
        let mut registry = RegistryService::in_memory();
        let id = registry
            .create(
                config(),
                vec![CommandDescriptor::new("who", "Who").on_run(|ctx| {
                    if ctx["user"] == "kim" {
                        Ok(())
                    } else {
                        Err(crate::error::ActionError::failed("wrong context"))
                    }
                })],
            )
            .unwrap();
        registry.set_context(id, serde_json::json!({ "user": "kim" }));
        let mut h = ComponentHarness::new(registry);
        let cmd = h.component_mut().open(id);
        h.run(cmd);
        for c in "who".chars() {
            h.send(key(KeyCode::Char(c)));
        }
        h.send(key(KeyCode::Enter));
        assert!(h.delivered().iter().any(|m| matches!(
            m,
            RegistryMessage::Instance { msg: Message::Executed(cmd), .. } if cmd == "who"
        )));
    }
}
