//! Key bindings for the palette and the footer legend built from them.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fmt;

/// One or more key combinations mapped to a described action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// The set of key combinations that trigger this binding.
    pub keys: Vec<KeyCombination>,
    /// Short legend label, e.g. `"↑↓"`. Falls back to the first key's display.
    pub label: Option<String>,
    /// A human-readable description of the action.
    pub description: String,
    /// Disabled bindings never match.
    pub enabled: bool,
}

/// A single key press with modifier keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombination {
    /// The base key code.
    pub code: KeyCode,
    /// Modifier keys that must be held alongside the base key.
    pub modifiers: KeyModifiers,
}

impl Binding {
    /// Bind a single key combination.
    pub fn new(key: KeyCombination, description: impl Into<String>) -> Self {
        Self::with_keys(vec![key], description)
    }

    /// Bind several key combinations to the same action.
    pub fn with_keys(keys: Vec<KeyCombination>, description: impl Into<String>) -> Self {
        Self {
            keys,
            label: None,
            description: description.into(),
            enabled: true,
        }
    }

    /// Set the legend label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Enable or disable the binding.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether `event` triggers this binding.
    ///
    /// Modifiers must match exactly so that `Enter` and `Alt+Enter` stay
    /// distinct. Shift is ignored for character keys, since terminals report
    /// it inconsistently for upper-case input.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.enabled && self.keys.iter().any(|k| k.matches(event))
    }

    /// Text shown in the footer legend.
    pub fn legend_key(&self) -> String {
        match (&self.label, self.keys.first()) {
            (Some(label), _) => label.clone(),
            (None, Some(key)) => key.to_string(),
            (None, None) => String::new(),
        }
    }
}

impl KeyCombination {
    /// A key with no modifiers.
    pub fn new(code: KeyCode) -> Self {
        Self::with_modifiers(code, KeyModifiers::NONE)
    }

    /// A key with Ctrl held.
    pub fn ctrl(code: KeyCode) -> Self {
        Self::with_modifiers(code, KeyModifiers::CONTROL)
    }

    /// A key with Alt held.
    pub fn alt(code: KeyCode) -> Self {
        Self::with_modifiers(code, KeyModifiers::ALT)
    }

    /// A key with Shift held.
    pub fn shift(code: KeyCode) -> Self {
        Self::with_modifiers(code, KeyModifiers::SHIFT)
    }

    /// A key with an explicit modifier set.
    pub fn with_modifiers(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    fn matches(&self, event: &KeyEvent) -> bool {
        if self.code != event.code {
            return false;
        }
        if event.modifiers == self.modifiers {
            return true;
        }
        matches!(event.code, KeyCode::Char(_))
            && event.modifiers.difference(KeyModifiers::SHIFT) == self.modifiers
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("Ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("Alt+")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            f.write_str("Shift+")?;
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("Space"),
            KeyCode::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            KeyCode::Enter => f.write_str("Enter"),
            KeyCode::Esc => f.write_str("Esc"),
            KeyCode::Tab => f.write_str("Tab"),
            KeyCode::BackTab => f.write_str("Shift+Tab"),
            KeyCode::Backspace => f.write_str("Backspace"),
            KeyCode::Up => f.write_str("↑"),
            KeyCode::Down => f.write_str("↓"),
            KeyCode::Left => f.write_str("←"),
            KeyCode::Right => f.write_str("→"),
            KeyCode::Home => f.write_str("Home"),
            KeyCode::End => f.write_str("End"),
            KeyCode::PageUp => f.write_str("PgUp"),
            KeyCode::PageDown => f.write_str("PgDn"),
            KeyCode::F(n) => write!(f, "F{n}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Every key the palette reacts to.
#[derive(Debug, Clone)]
pub struct PaletteKeyBindings {
    /// Global shortcut that opens a closed palette. Default: Ctrl+K.
    pub open: Binding,
    /// Close the palette. Default: Esc.
    pub close: Binding,
    /// Previous result. Default: Up, Ctrl+P.
    pub up: Binding,
    /// Next result. Default: Down, Ctrl+N.
    pub down: Binding,
    /// First result. Default: Home.
    pub first: Binding,
    /// Last result. Default: End.
    pub last: Binding,
    /// Page up. Default: PageUp.
    pub page_up: Binding,
    /// Page down. Default: PageDown.
    pub page_down: Binding,
    /// Execute and close. Default: Enter.
    pub execute: Binding,
    /// Execute without closing. Default: Alt+Enter, Ctrl+Enter.
    pub execute_background: Binding,
    /// Next category. Default: Tab.
    pub next_category: Binding,
    /// Previous category. Default: Shift+Tab.
    pub prev_category: Binding,
    /// Toggle the selected command's favorite flag. Default: Ctrl+F.
    pub toggle_favorite: Binding,
    /// Clear the query. Default: Ctrl+U.
    pub clear: Binding,
}

impl Default for PaletteKeyBindings {
    fn default() -> Self {
        Self {
            open: Binding::new(KeyCombination::ctrl(KeyCode::Char('k')), "Open palette"),
            close: Binding::new(KeyCombination::new(KeyCode::Esc), "Close"),
            up: Binding::with_keys(
                vec![
                    KeyCombination::new(KeyCode::Up),
                    KeyCombination::ctrl(KeyCode::Char('p')),
                ],
                "Navigate",
            )
            .label("↑↓"),
            down: Binding::with_keys(
                vec![
                    KeyCombination::new(KeyCode::Down),
                    KeyCombination::ctrl(KeyCode::Char('n')),
                ],
                "Next",
            ),
            first: Binding::new(KeyCombination::new(KeyCode::Home), "First"),
            last: Binding::new(KeyCombination::new(KeyCode::End), "Last"),
            page_up: Binding::new(KeyCombination::new(KeyCode::PageUp), "Page up"),
            page_down: Binding::new(KeyCombination::new(KeyCode::PageDown), "Page down"),
            execute: Binding::new(KeyCombination::new(KeyCode::Enter), "Run"),
            execute_background: Binding::with_keys(
                vec![
                    KeyCombination::alt(KeyCode::Enter),
                    KeyCombination::ctrl(KeyCode::Enter),
                ],
                "Run, keep open",
            ),
            next_category: Binding::new(KeyCombination::new(KeyCode::Tab), "Category"),
            prev_category: Binding::with_keys(
                vec![
                    KeyCombination::new(KeyCode::BackTab),
                    KeyCombination::shift(KeyCode::BackTab),
                ],
                "Previous category",
            ),
            toggle_favorite: Binding::new(KeyCombination::ctrl(KeyCode::Char('f')), "Favorite"),
            clear: Binding::new(KeyCombination::ctrl(KeyCode::Char('u')), "Clear"),
        }
    }
}

impl PaletteKeyBindings {
    /// The bindings shown in the footer legend, in display order.
    pub fn legend(&self) -> Vec<&Binding> {
        [
            &self.up,
            &self.execute,
            &self.execute_background,
            &self.next_category,
            &self.toggle_favorite,
            &self.close,
        ]
        .into_iter()
        .filter(|b| b.enabled)
        .collect()
    }
}
