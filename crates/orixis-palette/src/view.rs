//! Platform-neutral description of the palette overlay.
//!
//! [`build_view`] maps configuration plus instance state to a [`ViewTree`].
//! It is rebuilt from scratch on every call, so two calls with the same
//! input produce equal trees. [`render`](crate::render) commits a tree to a
//! ratatui frame; other front ends can walk the same tree.

use crate::config::PaletteConfig;
use crate::descriptor::CommandDescriptor;
use crate::ranking::{CategoryFilter, Ranked};
use crate::usage::UsageStore;
use std::collections::HashSet;

/// Everything the builder reads from a palette instance.
#[derive(Debug, Clone, Copy)]
pub struct ViewState<'a> {
    /// All commands, insertion order.
    pub commands: &'a [CommandDescriptor],
    /// Filtered results in display order.
    pub filtered: &'a [Ranked],
    /// Selected flat index into `filtered`.
    pub selected: usize,
    /// Raw query text.
    pub query: &'a str,
    /// Active category filter.
    pub category: &'a CategoryFilter,
    /// Shared usage state.
    pub usage: &'a UsageStore,
    /// Navigation trail; the breadcrumbs region is hidden when empty.
    pub breadcrumbs: &'a [String],
}

/// Whole overlay, top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTree {
    /// Border title.
    pub title: String,
    /// Search box.
    pub header: Header,
    /// Navigation trail, `None` when hidden.
    pub breadcrumbs: Option<Vec<String>>,
    /// Sidebar, results and preview.
    pub body: Body,
    /// Keyboard legend, `None` when disabled.
    pub footer: Option<Vec<Hint>>,
}

/// Search box contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Search glyph.
    pub icon: String,
    /// Current query.
    pub query: String,
    /// Shown when the query is empty.
    pub placeholder: String,
    /// Clear button glyph, present only for a non-empty query.
    pub clear: Option<String>,
}

/// Middle region.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Category entries, `None` when categories are disabled.
    pub sidebar: Option<Vec<SidebarEntry>>,
    /// Result list.
    pub results: Results,
    /// Details of the selected command, `None` when disabled or nothing is selected.
    pub preview: Option<Preview>,
}

/// One sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    /// Filter activated by clicking the entry.
    pub filter: CategoryFilter,
    /// Display label.
    pub label: String,
    /// Resolved glyph.
    pub icon: Option<String>,
    /// Commands reachable through this entry.
    pub count: usize,
    /// Whether this is the active filter.
    pub active: bool,
}

/// Result list layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Results {
    /// Nothing to show.
    Empty {
        /// Message for the user.
        message: String,
    },
    /// Plain list.
    Flat(Vec<ResultRow>),
    /// Rows under category headers. Row indices keep counting across groups.
    Grouped(Vec<ResultGroup>),
}

impl Results {
    /// All rows in display order.
    pub fn rows(&self) -> Vec<&ResultRow> {
        match self {
            Results::Empty { .. } => Vec::new(),
            Results::Flat(rows) => rows.iter().collect(),
            Results::Grouped(groups) => groups.iter().flat_map(|g| g.rows.iter()).collect(),
        }
    }
}

/// Rows of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultGroup {
    /// Category key.
    pub category: String,
    /// Header label.
    pub label: String,
    /// Header glyph.
    pub icon: Option<String>,
    /// Rows in ranked order.
    pub rows: Vec<ResultRow>,
}

/// One command row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    /// Flat index used by keyboard navigation.
    pub index: usize,
    /// Command id.
    pub command_id: String,
    /// Resolved glyph.
    pub icon: Option<String>,
    /// Title split into plain and matched runs.
    pub title: Vec<TitleSegment>,
    /// Description line.
    pub description: Option<String>,
    /// Shortcut badge.
    pub shortcut: Option<String>,
    /// Favorite toggle state, `None` when favorites are disabled.
    pub favorite: Option<bool>,
    /// Whether the row carries the selection.
    pub selected: bool,
}

/// A run of title text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleSegment {
    /// Text of the run.
    pub text: String,
    /// Whether the run matched the query.
    pub emphasized: bool,
}

/// Details of the selected command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// Command title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Category label.
    pub category: String,
    /// Shortcut label.
    pub shortcut: Option<String>,
    /// Times executed.
    pub runs: u64,
    /// Favorite flag.
    pub favorite: bool,
}

/// Footer legend entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    /// Key label.
    pub key: String,
    /// What it does.
    pub description: String,
}

/// Split `title` into runs, emphasizing chars whose index is in `positions`.
pub fn highlight(title: &str, positions: &[usize]) -> Vec<TitleSegment> {
    let marked: HashSet<usize> = positions.iter().copied().collect();
    let mut segments: Vec<TitleSegment> = Vec::new();
    for (i, c) in title.chars().enumerate() {
        let emphasized = marked.contains(&i);
        if let Some(seg) = segments.last_mut().filter(|s| s.emphasized == emphasized) {
            seg.text.push(c);
            continue;
        }
        segments.push(TitleSegment {
            text: c.to_string(),
            emphasized,
        });
    }
    segments
}

/// Whether results are shown under category headers.
pub fn is_grouped(config: &PaletteConfig, category: &CategoryFilter) -> bool {
    config.features.categories && *category == CategoryFilter::All
}

/// Build the overlay description.
pub fn build_view(config: &PaletteConfig, state: &ViewState<'_>) -> ViewTree {
    let header = Header {
        icon: config.icons.resolve("search"),
        query: state.query.to_string(),
        placeholder: config.placeholder.clone(),
        clear: (!state.query.is_empty()).then(|| config.icons.resolve("clear")),
    };

    let breadcrumbs = (!state.breadcrumbs.is_empty()).then(|| state.breadcrumbs.to_vec());

    let sidebar = config
        .features
        .categories
        .then(|| build_sidebar(config, state));

    let footer = config.features.footer.then(|| {
        config
            .keys
            .legend()
            .into_iter()
            .map(|b| Hint {
                key: b.legend_key(),
                description: b.description.clone(),
            })
            .collect()
    });

    ViewTree {
        title: config.title.clone(),
        header,
        breadcrumbs,
        body: Body {
            sidebar,
            results: build_results(config, state),
            preview: build_preview(config, state),
        },
        footer,
    }
}

fn build_row(config: &PaletteConfig, state: &ViewState<'_>, flat: usize, ranked: &Ranked) -> ResultRow {
    let cmd = &state.commands[ranked.index];
    let features = &config.features;
    ResultRow {
        index: flat,
        command_id: cmd.id.clone(),
        icon: cmd
            .icon
            .as_deref()
            .filter(|_| features.icons)
            .map(|key| config.icons.resolve(key)),
        title: highlight(&cmd.title, &ranked.positions),
        description: cmd.description.clone().filter(|_| features.descriptions),
        shortcut: cmd.shortcut.clone().filter(|_| features.shortcuts),
        favorite: features
            .favorites
            .then(|| state.usage.is_favorite(&cmd.id)),
        selected: flat == state.selected,
    }
}

fn build_results(config: &PaletteConfig, state: &ViewState<'_>) -> Results {
    if state.filtered.is_empty() {
        return Results::Empty {
            message: config.empty_message.clone(),
        };
    }

    let rows = state
        .filtered
        .iter()
        .enumerate()
        .map(|(flat, ranked)| build_row(config, state, flat, ranked));

    if !is_grouped(config, state.category) {
        return Results::Flat(rows.collect());
    }

    // `filtered` is already category-contiguous when grouped, so consecutive
    // runs form the groups.
    let mut groups: Vec<ResultGroup> = Vec::new();
    for row in rows {
        let category = &state.commands[state.filtered[row.index].index].category;
        if let Some(group) = groups.last_mut().filter(|g| &g.category == category) {
            group.rows.push(row);
            continue;
        }
        groups.push(ResultGroup {
            category: category.clone(),
            label: config.category_label(category),
            icon: config
                .category_icon(category)
                .filter(|_| config.features.icons)
                .map(|key| config.icons.resolve(key)),
            rows: vec![row],
        });
    }
    Results::Grouped(groups)
}

/// Filters reachable from the sidebar, in display order: `All`, then the
/// enabled special views, then configured categories that have commands,
/// then any other category in order of first appearance.
pub fn category_filters(config: &PaletteConfig, commands: &[CommandDescriptor]) -> Vec<CategoryFilter> {
    let mut filters = vec![CategoryFilter::All];
    if config.features.favorites {
        filters.push(CategoryFilter::Favorites);
    }
    if config.features.recent {
        filters.push(CategoryFilter::Recent);
    }
    let mut keys: Vec<&str> = config.categories.iter().map(|c| c.key.as_str()).collect();
    for cmd in commands {
        if !keys.contains(&cmd.category.as_str()) {
            keys.push(&cmd.category);
        }
    }
    filters.extend(
        keys.into_iter()
            .filter(|key| commands.iter().any(|c| c.category == *key))
            .map(|key| CategoryFilter::Named(key.to_string())),
    );
    filters
}

fn build_sidebar(config: &PaletteConfig, state: &ViewState<'_>) -> Vec<SidebarEntry> {
    let icon = |key: &str| config.features.icons.then(|| config.icons.resolve(key));
    category_filters(config, state.commands)
        .into_iter()
        .map(|filter| {
            let (label, icon, count) = match &filter {
                CategoryFilter::All => ("All".to_string(), icon("all"), state.commands.len()),
                CategoryFilter::Favorites => (
                    "Favorites".to_string(),
                    icon("star"),
                    state
                        .commands
                        .iter()
                        .filter(|c| state.usage.is_favorite(&c.id))
                        .count(),
                ),
                CategoryFilter::Recent => (
                    "Recent".to_string(),
                    icon("recent"),
                    state
                        .commands
                        .iter()
                        .filter(|c| state.usage.recency_rank(&c.id).is_some())
                        .count(),
                ),
                CategoryFilter::Named(key) => (
                    config.category_label(key),
                    config.category_icon(key).and_then(icon),
                    state.commands.iter().filter(|c| &c.category == key).count(),
                ),
            };
            SidebarEntry {
                active: &filter == state.category,
                filter,
                label,
                icon,
                count,
            }
        })
        .collect()
}

fn build_preview(config: &PaletteConfig, state: &ViewState<'_>) -> Option<Preview> {
    if !config.features.preview {
        return None;
    }
    let ranked = state.filtered.get(state.selected)?;
    let cmd = &state.commands[ranked.index];
    Some(Preview {
        title: cmd.title.clone(),
        description: cmd.description.clone(),
        category: config.category_label(&cmd.category),
        shortcut: cmd.shortcut.clone(),
        runs: state.usage.frequency(&cmd.id),
        favorite: state.usage.is_favorite(&cmd.id),
    })
}
