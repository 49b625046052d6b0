//! Palette configuration: visual style, size, feature toggles, key bindings,
//! icons and category taxonomy.
//!
//! Every field has a default. Override what you need with the `with_*`
//! builders, or apply a [`ConfigPatch`] (typically parsed from JSON) on top of
//! [`PaletteConfig::default`].

use crate::error::PaletteError;
use crate::key::PaletteKeyBindings;
use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Named colour scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light text on dark background.
    #[default]
    Dark,
    /// Dark text on light background.
    Light,
    /// Terminal defaults, emphasis through modifiers only.
    Minimal,
}

/// Overlay dimensions, as a share of the host area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteSize {
    /// 40% × 40%.
    Small,
    /// 60% × 60%.
    #[default]
    Medium,
    /// 80% × 75%.
    Large,
    /// Whole host area.
    Fullscreen,
}

impl PaletteSize {
    /// `(percent_x, percent_y)` of the host area.
    pub fn percent(self) -> (u16, u16) {
        match self {
            PaletteSize::Small => (40, 40),
            PaletteSize::Medium => (60, 60),
            PaletteSize::Large => (80, 75),
            PaletteSize::Fullscreen => (100, 100),
        }
    }
}

/// Closing transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Animation {
    /// Close immediately.
    None,
    /// Dim out.
    #[default]
    Fade,
    /// Slide away.
    Slide,
}

impl Animation {
    /// How long the overlay stays in `Closing` before it is torn down.
    pub fn closing_duration(self) -> Duration {
        match self {
            Animation::None => Duration::ZERO,
            Animation::Fade => Duration::from_millis(120),
            Animation::Slide => Duration::from_millis(180),
        }
    }
}

/// How queries are matched against commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// Scored exact/prefix/substring/subsequence match on the title.
    #[default]
    Fuzzy,
    /// Case-insensitive substring on title, description or keywords.
    Simple,
}

/// What to do when a command id is registered twice in one palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail the registration with [`PaletteError::DuplicateId`].
    Reject,
    /// Replace the earlier descriptor, keeping its position.
    #[default]
    Overwrite,
}

/// What happens to a pending command action when the palette closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingPolicy {
    /// Abort the action; it settles as [`ActionError::Cancelled`](crate::error::ActionError::Cancelled).
    Cancel,
    /// Let it finish in the background.
    #[default]
    Detach,
}

/// Feature toggles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Features {
    /// Category sidebar and grouped results.
    pub categories: bool,
    /// Favorite toggles and the favorites view.
    pub favorites: bool,
    /// Recents view entry in the sidebar.
    pub recent: bool,
    /// Preview pane for the selected command.
    pub preview: bool,
    /// Keyboard legend at the bottom.
    pub footer: bool,
    /// Command icons.
    pub icons: bool,
    /// Description line under each title.
    pub descriptions: bool,
    /// Shortcut badges.
    pub shortcuts: bool,
    /// Break score ties by favorite, recency and frequency before insertion order.
    pub usage_tiebreak: bool,
    /// With no query and no recents, list every command instead of nothing.
    pub all_when_no_recents: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            categories: true,
            favorites: true,
            recent: true,
            preview: false,
            footer: true,
            icons: true,
            descriptions: true,
            shortcuts: true,
            usage_tiebreak: false,
            all_when_no_recents: false,
        }
    }
}

/// Glyphs keyed by name. Unknown keys render as the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconSet {
    glyphs: HashMap<String, String>,
}

impl Default for IconSet {
    fn default() -> Self {
        let glyphs = [
            ("search", "⌕"),
            ("clear", "✕"),
            ("star", "★"),
            ("star-empty", "☆"),
            ("all", "◆"),
            ("recent", "↺"),
            ("actions", "⚡"),
            ("navigation", "➜"),
            ("file", "▤"),
            ("settings", "⚙"),
            ("help", "?"),
            ("user", "☺"),
            ("mail", "✉"),
            ("tool", "⚒"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { glyphs }
    }
}

impl IconSet {
    /// Resolve a glyph key, falling back to the raw text.
    pub fn resolve(&self, key: &str) -> String {
        self.glyphs
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Add or replace a glyph.
    pub fn insert(&mut self, key: impl Into<String>, glyph: impl Into<String>) {
        self.glyphs.insert(key.into(), glyph.into());
    }
}

/// One entry of the category taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryInfo {
    /// Key matched against [`CommandDescriptor::category`](crate::descriptor::CommandDescriptor::category).
    pub key: String,
    /// Display label.
    pub label: String,
    /// Icon key or raw glyph.
    #[serde(default)]
    pub icon: Option<String>,
}

impl CategoryInfo {
    /// Build a category entry.
    pub fn new(key: impl Into<String>, label: impl Into<String>, icon: Option<&str>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            icon: icon.map(str::to_string),
        }
    }
}

fn default_categories() -> Vec<CategoryInfo> {
    vec![
        CategoryInfo::new("actions", "Actions", Some("actions")),
        CategoryInfo::new("navigation", "Navigation", Some("navigation")),
        CategoryInfo::new("files", "Files", Some("file")),
        CategoryInfo::new("settings", "Settings", Some("settings")),
        CategoryInfo::new("help", "Help", Some("help")),
    ]
}

/// Styles derived from a [`Theme`].
#[derive(Debug, Clone)]
pub struct PaletteStyle {
    /// Overlay background.
    pub background: Style,
    /// Overlay border.
    pub border: Style,
    /// Typed query.
    pub query: Style,
    /// Placeholder shown for an empty query.
    pub placeholder: Style,
    /// Search icon and prompt.
    pub prompt: Style,
    /// Unselected row title.
    pub title: Style,
    /// Matched characters inside a title.
    pub matched: Style,
    /// Selected row.
    pub selected: Style,
    /// Description line.
    pub description: Style,
    /// Shortcut badge.
    pub shortcut: Style,
    /// Group header.
    pub group_header: Style,
    /// Sidebar entry.
    pub sidebar: Style,
    /// Active sidebar entry.
    pub sidebar_active: Style,
    /// Favorite toggle.
    pub favorite: Style,
    /// Footer legend.
    pub footer: Style,
    /// Empty-results message.
    pub empty: Style,
    /// Applied over everything while the closing transition runs.
    pub closing: Style,
}

impl PaletteStyle {
    /// Styles for a theme.
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                background: Style::default().bg(Color::Rgb(30, 30, 46)).fg(Color::Gray),
                border: Style::default().fg(Color::Cyan),
                query: Style::default().fg(Color::White),
                placeholder: Style::default().fg(Color::DarkGray),
                prompt: Style::default().fg(Color::Cyan),
                title: Style::default().fg(Color::Gray),
                matched: Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
                selected: Style::default()
                    .bg(Color::Rgb(49, 50, 68))
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
                description: Style::default().fg(Color::DarkGray),
                shortcut: Style::default().fg(Color::Magenta),
                group_header: Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
                sidebar: Style::default().fg(Color::Gray),
                sidebar_active: Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
                favorite: Style::default().fg(Color::Yellow),
                footer: Style::default().fg(Color::DarkGray),
                empty: Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
                closing: Style::default().add_modifier(Modifier::DIM),
            },
            Theme::Light => Self {
                background: Style::default().bg(Color::White).fg(Color::Black),
                border: Style::default().fg(Color::Blue),
                query: Style::default().fg(Color::Black),
                placeholder: Style::default().fg(Color::Gray),
                prompt: Style::default().fg(Color::Blue),
                title: Style::default().fg(Color::Black),
                matched: Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                selected: Style::default()
                    .bg(Color::LightBlue)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
                description: Style::default().fg(Color::DarkGray),
                shortcut: Style::default().fg(Color::Magenta),
                group_header: Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD),
                sidebar: Style::default().fg(Color::Black),
                sidebar_active: Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
                favorite: Style::default().fg(Color::Rgb(200, 140, 0)),
                footer: Style::default().fg(Color::DarkGray),
                empty: Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
                closing: Style::default().add_modifier(Modifier::DIM),
            },
            Theme::Minimal => Self {
                background: Style::default(),
                border: Style::default(),
                query: Style::default(),
                placeholder: Style::default().add_modifier(Modifier::DIM),
                prompt: Style::default().add_modifier(Modifier::BOLD),
                title: Style::default(),
                matched: Style::default().add_modifier(Modifier::UNDERLINED),
                selected: Style::default().add_modifier(Modifier::REVERSED),
                description: Style::default().add_modifier(Modifier::DIM),
                shortcut: Style::default().add_modifier(Modifier::DIM),
                group_header: Style::default().add_modifier(Modifier::BOLD),
                sidebar: Style::default(),
                sidebar_active: Style::default().add_modifier(Modifier::REVERSED),
                favorite: Style::default().add_modifier(Modifier::BOLD),
                footer: Style::default().add_modifier(Modifier::DIM),
                empty: Style::default().add_modifier(Modifier::ITALIC),
                closing: Style::default().add_modifier(Modifier::DIM),
            },
        }
    }
}

/// Complete palette configuration.
#[derive(Debug, Clone)]
pub struct PaletteConfig {
    /// Colour scheme.
    pub theme: Theme,
    /// Overlay size.
    pub size: PaletteSize,
    /// Closing transition.
    pub animation: Animation,
    /// Title shown in the overlay border.
    pub title: String,
    /// Placeholder for the empty search box.
    pub placeholder: String,
    /// Message shown when nothing matches.
    pub empty_message: String,
    /// Upper bound on displayed results.
    pub max_results: usize,
    /// Rows moved by PageUp/PageDown.
    pub page_size: usize,
    /// Matching strategy.
    pub search: SearchStrategy,
    /// Feature toggles.
    pub features: Features,
    /// Key bindings.
    pub keys: PaletteKeyBindings,
    /// Icon glyphs.
    pub icons: IconSet,
    /// Category taxonomy, in sidebar order.
    pub categories: Vec<CategoryInfo>,
    /// Duplicate id handling.
    pub on_duplicate_id: DuplicatePolicy,
    /// Pending action handling on close.
    pub on_close_while_pending: PendingPolicy,
    /// Allow creating a palette with no commands.
    pub allow_empty: bool,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            size: PaletteSize::default(),
            animation: Animation::default(),
            title: "Commands".to_string(),
            placeholder: "Type a command or search...".to_string(),
            empty_message: "No commands found".to_string(),
            max_results: 50,
            page_size: 8,
            search: SearchStrategy::default(),
            features: Features::default(),
            keys: PaletteKeyBindings::default(),
            icons: IconSet::default(),
            categories: default_categories(),
            on_duplicate_id: DuplicatePolicy::default(),
            on_close_while_pending: PendingPolicy::default(),
            allow_empty: false,
        }
    }
}

impl PaletteConfig {
    /// Set the colour scheme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Set the overlay size.
    pub fn with_size(mut self, size: PaletteSize) -> Self {
        self.size = size;
        self
    }

    /// Set the closing transition.
    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animation = animation;
        self
    }

    /// Set the matching strategy.
    pub fn with_search(mut self, search: SearchStrategy) -> Self {
        self.search = search;
        self
    }

    /// Replace the feature toggles.
    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    /// Replace the key bindings.
    pub fn with_keys(mut self, keys: PaletteKeyBindings) -> Self {
        self.keys = keys;
        self
    }

    /// Replace the category taxonomy.
    pub fn with_categories(mut self, categories: Vec<CategoryInfo>) -> Self {
        self.categories = categories;
        self
    }

    /// Set the placeholder text.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Set the border title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the result cap.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the duplicate id policy.
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.on_duplicate_id = policy;
        self
    }

    /// Set the pending action policy.
    pub fn with_pending_policy(mut self, policy: PendingPolicy) -> Self {
        self.on_close_while_pending = policy;
        self
    }

    /// Allow creating a palette without commands.
    pub fn with_allow_empty(mut self, allow_empty: bool) -> Self {
        self.allow_empty = allow_empty;
        self
    }

    /// Styles for the configured theme.
    pub fn style(&self) -> PaletteStyle {
        PaletteStyle::for_theme(self.theme)
    }

    /// Label for a category key, falling back to the key itself.
    pub fn category_label(&self, key: &str) -> String {
        self.categories
            .iter()
            .find(|c| c.key == key)
            .map_or_else(|| key.to_string(), |c| c.label.clone())
    }

    /// Icon key for a category, if configured.
    pub fn category_icon(&self, key: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.key == key)
            .and_then(|c| c.icon.as_deref())
    }

    /// Reject values the palette cannot work with.
    pub fn validate(&self) -> Result<(), PaletteError> {
        if self.max_results == 0 {
            return Err(PaletteError::InvalidConfig(
                "max_results must be at least 1".into(),
            ));
        }
        if self.page_size == 0 {
            return Err(PaletteError::InvalidConfig(
                "page_size must be at least 1".into(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for category in &self.categories {
            if matches!(category.key.as_str(), "all" | "favorites" | "recent") {
                return Err(PaletteError::InvalidConfig(format!(
                    "category key `{}` is reserved",
                    category.key
                )));
            }
            if !seen.insert(category.key.as_str()) {
                return Err(PaletteError::InvalidConfig(format!(
                    "category key `{}` listed twice",
                    category.key
                )));
            }
        }
        Ok(())
    }

    /// Overlay the fields set in `patch`.
    pub fn apply(mut self, patch: ConfigPatch) -> Self {
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(size) = patch.size {
            self.size = size;
        }
        if let Some(animation) = patch.animation {
            self.animation = animation;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(placeholder) = patch.placeholder {
            self.placeholder = placeholder;
        }
        if let Some(empty_message) = patch.empty_message {
            self.empty_message = empty_message;
        }
        if let Some(max_results) = patch.max_results {
            self.max_results = max_results;
        }
        if let Some(page_size) = patch.page_size {
            self.page_size = page_size;
        }
        if let Some(search) = patch.search {
            self.search = search;
        }
        if let Some(features) = patch.features {
            self.features = features;
        }
        if let Some(categories) = patch.categories {
            self.categories = categories;
        }
        if let Some(icons) = patch.icons {
            for (key, glyph) in icons {
                self.icons.insert(key, glyph);
            }
        }
        if let Some(policy) = patch.on_duplicate_id {
            self.on_duplicate_id = policy;
        }
        if let Some(policy) = patch.on_close_while_pending {
            self.on_close_while_pending = policy;
        }
        if let Some(allow_empty) = patch.allow_empty {
            self.allow_empty = allow_empty;
        }
        self
    }
}

/// Partial configuration. Unset fields keep their current value.
///
/// ```rust,ignore
/// let patch = ConfigPatch::from_json_str(r#"{ "theme": "light", "max_results": 20 }"#)?;
/// let config = PaletteConfig::default().apply(patch);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigPatch {
    pub theme: Option<Theme>,
    pub size: Option<PaletteSize>,
    pub animation: Option<Animation>,
    pub title: Option<String>,
    pub placeholder: Option<String>,
    pub empty_message: Option<String>,
    pub max_results: Option<usize>,
    pub page_size: Option<usize>,
    pub search: Option<SearchStrategy>,
    pub features: Option<Features>,
    pub categories: Option<Vec<CategoryInfo>>,
    pub icons: Option<HashMap<String, String>>,
    pub on_duplicate_id: Option<DuplicatePolicy>,
    pub on_close_while_pending: Option<PendingPolicy>,
    pub allow_empty: Option<bool>,
}

impl ConfigPatch {
    /// Parse a patch from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, PaletteError> {
        serde_json::from_str(text).map_err(|err| PaletteError::InvalidConfig(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(PaletteConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_max_results_is_rejected() {
        let config = PaletteConfig::default().with_max_results(0);
        assert!(matches!(
            config.validate(),
            Err(PaletteError::InvalidConfig(_))
        ));
    }

    #[test]
    fn reserved_category_key_is_rejected() {
        let config = PaletteConfig::default()
            .with_categories(vec![CategoryInfo::new("all", "Everything", None)]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn patch_overrides_only_what_it_sets() {
        let patch = ConfigPatch::from_json_str(
            r#"{ "theme": "light", "max_results": 20, "on_duplicate_id": "reject" }"#,
        )
        .unwrap();
        let config = PaletteConfig::default().apply(patch);
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.max_results, 20);
        assert_eq!(config.on_duplicate_id, DuplicatePolicy::Reject);
        assert_eq!(config.size, PaletteSize::Medium);
        assert_eq!(config.placeholder, PaletteConfig::default().placeholder);
    }

    #[test]
    fn partial_features_fill_from_defaults() {
        let patch = ConfigPatch::from_json_str(r#"{ "features": { "preview": true } }"#).unwrap();
        let config = PaletteConfig::default().apply(patch);
        assert!(config.features.preview);
        assert!(config.features.categories);
    }

    #[test]
    fn unknown_patch_field_is_an_error() {
        assert!(ConfigPatch::from_json_str(r#"{ "colour": "red" }"#).is_err());
    }

    #[test]
    fn icon_set_falls_back_to_raw_text() {
        let icons = IconSet::default();
        assert_eq!(icons.resolve("star"), "★");
        assert_eq!(icons.resolve("§"), "§");
    }

    #[test]
    fn animation_none_closes_immediately() {
        assert_eq!(Animation::None.closing_duration(), Duration::ZERO);
        assert!(Animation::Fade.closing_duration() > Duration::ZERO);
    }
}
