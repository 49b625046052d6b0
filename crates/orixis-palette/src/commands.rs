//! The ordered command list owned by one palette instance.

use crate::config::DuplicatePolicy;
use crate::descriptor::CommandDescriptor;
use crate::error::PaletteError;

/// Commands in insertion order. Insertion order is the display tiebreak.
#[derive(Debug, Clone, Default)]
pub struct CommandList {
    commands: Vec<CommandDescriptor>,
    policy: DuplicatePolicy,
}

impl CommandList {
    /// An empty list with the given duplicate policy.
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            commands: Vec::new(),
            policy,
        }
    }

    /// Replace the whole list.
    ///
    /// Commands without an id get `cmd-<index>`, the index being their
    /// position in `commands`. On error the previous list is left untouched.
    pub fn set_commands(&mut self, commands: Vec<CommandDescriptor>) -> Result<(), PaletteError> {
        let mut next = CommandList::new(self.policy);
        for (index, mut cmd) in commands.into_iter().enumerate() {
            if cmd.id.is_empty() {
                cmd.id = format!("cmd-{index}");
            }
            next.insert(cmd)?;
        }
        self.commands = next.commands;
        Ok(())
    }

    /// Append a command. A missing id becomes `cmd-<len>`.
    pub fn add_command(&mut self, mut cmd: CommandDescriptor) -> Result<(), PaletteError> {
        if cmd.id.is_empty() {
            cmd.id = self.free_id(self.commands.len());
        }
        self.insert(cmd)
    }

    /// Remove a command by id. Returns the removed descriptor.
    pub fn remove_command(&mut self, id: &str) -> Option<CommandDescriptor> {
        let index = self.commands.iter().position(|c| c.id == id)?;
        Some(self.commands.remove(index))
    }

    /// Look up by id.
    pub fn get(&self, id: &str) -> Option<&CommandDescriptor> {
        self.commands.iter().find(|c| c.id == id)
    }

    /// All commands in insertion order.
    pub fn as_slice(&self) -> &[CommandDescriptor] {
        &self.commands
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn insert(&mut self, cmd: CommandDescriptor) -> Result<(), PaletteError> {
        match self.commands.iter().position(|c| c.id == cmd.id) {
            None => {
                self.commands.push(cmd);
                Ok(())
            }
            Some(_) if self.policy == DuplicatePolicy::Reject => {
                Err(PaletteError::DuplicateId(cmd.id))
            }
            Some(existing) => {
                tracing::debug!(id = %cmd.id, "overwriting command with duplicate id");
                self.commands[existing] = cmd;
                Ok(())
            }
        }
    }

    // `cmd-<len>` can already be taken after removals; walk forward until free.
    fn free_id(&self, start: usize) -> String {
        (start..)
            .map(|n| format!("cmd-{n}"))
            .find(|id| self.get(id).is_none())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(title: &str) -> CommandDescriptor {
        CommandDescriptor::untitled_id(title)
    }

    #[test]
    fn set_commands_generates_missing_ids_from_position() {
        let mut list = CommandList::default();
        list.set_commands(vec![
            titled("Zero"),
            CommandDescriptor::new("named", "Named"),
            titled("Two"),
        ])
        .unwrap();
        let ids: Vec<_> = list.as_slice().iter().map(|c| c.id()).collect();
        assert_eq!(ids, ["cmd-0", "named", "cmd-2"]);
    }

    #[test]
    fn add_command_generates_free_id() {
        let mut list = CommandList::default();
        list.set_commands(vec![titled("A"), titled("B")]).unwrap();
        list.remove_command("cmd-0");
        list.add_command(titled("C")).unwrap();
        let ids: Vec<_> = list.as_slice().iter().map(|c| c.id()).collect();
        assert_eq!(ids, ["cmd-1", "cmd-2"]);
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut list = CommandList::new(DuplicatePolicy::Overwrite);
        list.set_commands(vec![
            CommandDescriptor::new("a", "First"),
            CommandDescriptor::new("b", "Second"),
        ])
        .unwrap();
        list.add_command(CommandDescriptor::new("a", "Replaced")).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice()[0].title, "Replaced");
    }

    #[test]
    fn reject_fails_and_leaves_list_untouched() {
        let mut list = CommandList::new(DuplicatePolicy::Reject);
        list.set_commands(vec![CommandDescriptor::new("a", "First")]).unwrap();
        let err = list
            .set_commands(vec![
                CommandDescriptor::new("x", "X"),
                CommandDescriptor::new("x", "X again"),
            ])
            .unwrap_err();
        assert_eq!(err, PaletteError::DuplicateId("x".into()));
        assert_eq!(list.as_slice()[0].id(), "a");

        assert!(list.add_command(CommandDescriptor::new("a", "Dup")).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_unknown_is_none() {
        let mut list = CommandList::default();
        assert!(list.remove_command("nope").is_none());
    }
}
