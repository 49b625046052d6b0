//! Ratatui adapter: draws a [`ViewTree`] and reports where the clickable
//! parts ended up.

use crate::config::{PaletteSize, PaletteStyle};
use crate::ranking::CategoryFilter;
use crate::view::{Body, Header, Hint, Preview, ResultRow, Results, SidebarEntry, ViewTree};
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const FAVORITE_ON: &str = "★";
const FAVORITE_OFF: &str = "☆";
const SELECTED_MARKER: &str = "› ";
const SIDEBAR_MAX_WIDTH: u16 = 24;

/// What a mouse click landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
    /// A result row, by flat index.
    Row(usize),
    /// The favorite toggle of a result row.
    Favorite(usize),
    /// A sidebar entry.
    Category(CategoryFilter),
    /// The clear button in the search box.
    Clear,
}

/// Clickable zones from the last render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitMap {
    overlay: Rect,
    zones: Vec<(Rect, HitTarget)>,
}

impl HitMap {
    /// Area covered by the overlay. Empty before the first render.
    pub fn overlay(&self) -> Rect {
        self.overlay
    }

    /// Whether `(column, row)` falls inside the overlay.
    pub fn inside(&self, column: u16, row: u16) -> bool {
        self.overlay.contains(Position::new(column, row))
    }

    /// Target under `(column, row)`. Later zones win, so a favorite toggle
    /// takes precedence over the row it sits on.
    pub fn hit(&self, column: u16, row: u16) -> Option<&HitTarget> {
        let pos = Position::new(column, row);
        self.zones
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(pos))
            .map(|(_, target)| target)
    }

    /// Where `target` was drawn, if it was.
    pub fn locate(&self, target: &HitTarget) -> Option<Rect> {
        self.zones
            .iter()
            .find(|(_, t)| t == target)
            .map(|(rect, _)| *rect)
    }

    fn push(&mut self, rect: Rect, target: HitTarget) {
        if rect.width > 0 && rect.height > 0 {
            self.zones.push((rect, target));
        }
    }
}

/// Where the overlay sits inside `area` for a given size.
///
/// Centered, never smaller than what the header and a couple of rows need.
pub fn palette_area(size: PaletteSize, area: Rect) -> Rect {
    if size == PaletteSize::Fullscreen {
        return area;
    }
    let (px, py) = size.percent();
    let width = (area.width as u32 * px as u32 / 100) as u16;
    let height = (area.height as u32 * py as u32 / 100) as u16;
    let width = width.max(40).min(area.width);
    let height = height.max(8).min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

/// Draw `tree` into `frame`. `closing` dims the overlay for the closing
/// transition.
pub fn render_view(
    tree: &ViewTree,
    style: &PaletteStyle,
    closing: bool,
    frame: &mut Frame,
    area: Rect,
) -> HitMap {
    let mut hits = HitMap {
        overlay: area,
        zones: Vec::new(),
    };
    if area.width < 4 || area.height < 3 {
        return hits;
    }

    frame.render_widget(Clear, area);
    let block = Block::bordered()
        .title(Line::styled(format!(" {} ", tree.title), style.border))
        .border_style(style.border)
        .style(style.background);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut constraints = vec![Constraint::Length(1), Constraint::Length(1)];
    if tree.breadcrumbs.is_some() {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Min(0));
    if tree.footer.is_some() {
        constraints.push(Constraint::Length(1));
    }
    let rows = Layout::vertical(constraints).split(inner);

    let mut next = 0;
    let mut take = || {
        let rect = rows[next];
        next += 1;
        rect
    };

    let header = take();
    render_header(&tree.header, style, closing, frame, header, &mut hits);
    let rule = take();
    frame.render_widget(
        Paragraph::new("─".repeat(rule.width as usize)).style(style.border),
        rule,
    );
    if let Some(trail) = &tree.breadcrumbs {
        let crumbs = take();
        frame.render_widget(
            Paragraph::new(trail.join(" › ")).style(style.description),
            crumbs,
        );
    }
    let body = take();
    render_body(&tree.body, style, frame, body, &mut hits);
    if let Some(hints) = &tree.footer {
        render_footer(hints, style, frame, take());
    }

    if closing {
        frame.buffer_mut().set_style(area, style.closing);
    }
    hits
}

fn render_header(
    header: &Header,
    style: &PaletteStyle,
    closing: bool,
    frame: &mut Frame,
    area: Rect,
    hits: &mut HitMap,
) {
    let prefix = format!("{} ", header.icon);
    let mut spans = vec![Span::styled(prefix.clone(), style.prompt)];
    if header.query.is_empty() {
        spans.push(Span::styled(header.placeholder.clone(), style.placeholder));
    } else {
        spans.push(Span::styled(header.query.clone(), style.query));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);

    if let Some(glyph) = &header.clear {
        let width = (glyph.width() as u16).min(area.width);
        let rect = Rect::new(area.right() - width, area.y, width, 1);
        frame.render_widget(Paragraph::new(glyph.as_str()).style(style.placeholder), rect);
        hits.push(rect, HitTarget::Clear);
    }

    if !closing {
        let offset = (prefix.width() + header.query.width()) as u16;
        let x = (area.x + offset).min(area.right().saturating_sub(1));
        frame.set_cursor_position(Position::new(x, area.y));
    }
}

fn render_body(body: &Body, style: &PaletteStyle, frame: &mut Frame, area: Rect, hits: &mut HitMap) {
    let mut constraints = Vec::new();
    if let Some(entries) = &body.sidebar {
        constraints.push(Constraint::Length(sidebar_width(entries).min(area.width / 3)));
    }
    constraints.push(Constraint::Min(10));
    if body.preview.is_some() {
        constraints.push(Constraint::Percentage(35));
    }
    let columns = Layout::horizontal(constraints).split(area);

    let mut col = 0;
    if let Some(entries) = &body.sidebar {
        render_sidebar(entries, style, frame, columns[col], hits);
        col += 1;
    }
    render_results(&body.results, style, frame, columns[col], hits);
    col += 1;
    if let Some(preview) = &body.preview {
        render_preview(preview, style, frame, columns[col]);
    }
}

fn sidebar_entry_text(entry: &SidebarEntry) -> String {
    match &entry.icon {
        Some(icon) => format!("{icon} {} {}", entry.label, entry.count),
        None => format!("{} {}", entry.label, entry.count),
    }
}

fn sidebar_width(entries: &[SidebarEntry]) -> u16 {
    let widest = entries
        .iter()
        .map(|e| sidebar_entry_text(e).width())
        .max()
        .unwrap_or(0);
    (widest as u16 + 3).min(SIDEBAR_MAX_WIDTH)
}

fn render_sidebar(
    entries: &[SidebarEntry],
    style: &PaletteStyle,
    frame: &mut Frame,
    area: Rect,
    hits: &mut HitMap,
) {
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(style.border);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = entries
        .iter()
        .take(inner.height as usize)
        .map(|entry| {
            let text = truncate(&format!(" {}", sidebar_entry_text(entry)), inner.width as usize);
            let line_style = if entry.active {
                style.sidebar_active
            } else {
                style.sidebar
            };
            Line::styled(text, line_style)
        })
        .collect();
    for (i, entry) in entries.iter().take(inner.height as usize).enumerate() {
        let rect = Rect::new(inner.x, inner.y + i as u16, inner.width, 1);
        hits.push(rect, HitTarget::Category(entry.filter.clone()));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

enum ListLine<'a> {
    Group(String, Option<&'a str>),
    Row(&'a ResultRow),
}

fn render_results(
    results: &Results,
    style: &PaletteStyle,
    frame: &mut Frame,
    area: Rect,
    hits: &mut HitMap,
) {
    let items: Vec<ListLine<'_>> = match results {
        Results::Empty { message } => {
            let y = area.y + area.height / 2;
            let rect = Rect::new(area.x, y.min(area.bottom().saturating_sub(1)), area.width, 1);
            frame.render_widget(Paragraph::new(message.as_str()).style(style.empty).centered(), rect);
            return;
        }
        Results::Flat(rows) => rows.iter().map(ListLine::Row).collect(),
        Results::Grouped(groups) => groups
            .iter()
            .flat_map(|g| {
                std::iter::once(ListLine::Group(g.label.clone(), g.icon.as_deref()))
                    .chain(g.rows.iter().map(ListLine::Row))
            })
            .collect(),
    };

    let height = area.height as usize;
    if height == 0 {
        return;
    }
    let selected_line = items
        .iter()
        .position(|item| matches!(item, ListLine::Row(row) if row.selected))
        .unwrap_or(0);
    let offset = scroll_offset(selected_line, height);

    let width = area.width as usize;
    let mut lines = Vec::with_capacity(height);
    for (i, item) in items.iter().skip(offset).take(height).enumerate() {
        let y = area.y + i as u16;
        match item {
            ListLine::Group(label, icon) => {
                let text = match icon {
                    Some(icon) => format!("{icon} {label}"),
                    None => label.clone(),
                };
                lines.push(Line::styled(truncate(&text, width), style.group_header));
            }
            ListLine::Row(row) => {
                lines.push(row_line(row, style, width));
                hits.push(Rect::new(area.x, y, area.width, 1), HitTarget::Row(row.index));
                if row.favorite.is_some() && area.width >= 2 {
                    hits.push(
                        Rect::new(area.right() - 2, y, 2, 1),
                        HitTarget::Favorite(row.index),
                    );
                }
            }
        }
    }
    frame.render_widget(Paragraph::new(lines), area);
}

// The view is stateless, so scroll just far enough that the selected line is
// the last visible one.
fn scroll_offset(selected_line: usize, height: usize) -> usize {
    (selected_line + 1).saturating_sub(height)
}

fn row_line(row: &ResultRow, style: &PaletteStyle, width: usize) -> Line<'static> {
    let base = if row.selected { style.selected } else { style.title };

    let mut right = Vec::new();
    let mut right_width = 0;
    if let Some(shortcut) = &row.shortcut {
        right.push(Span::styled(format!(" {shortcut}"), base.patch(style.shortcut)));
        right_width += shortcut.width() + 1;
    }
    if let Some(favorite) = row.favorite {
        let glyph = if favorite { FAVORITE_ON } else { FAVORITE_OFF };
        right.push(Span::styled(format!(" {glyph}"), base.patch(style.favorite)));
        right_width += glyph.width() + 1;
    }

    let mut left = Vec::new();
    let marker = if row.selected { SELECTED_MARKER } else { "  " };
    left.push(Span::styled(marker.to_string(), base));
    let mut budget = width.saturating_sub(right_width + marker.width());
    if let Some(icon) = &row.icon {
        let text = truncate(&format!("{icon} "), budget);
        budget -= text.width();
        left.push(Span::styled(text, base));
    }
    for seg in &row.title {
        if budget == 0 {
            break;
        }
        let text = truncate(&seg.text, budget);
        budget -= text.width();
        let seg_style = if seg.emphasized { base.patch(style.matched) } else { base };
        left.push(Span::styled(text, seg_style));
    }
    if let Some(description) = &row.description {
        if budget > 2 {
            let text = truncate(&format!("  {description}"), budget);
            budget -= text.width();
            left.push(Span::styled(text, base.patch(style.description)));
        }
    }

    let mut spans = left;
    spans.push(Span::styled(" ".repeat(budget), base));
    spans.extend(right);
    Line::from(spans)
}

fn render_preview(preview: &Preview, style: &PaletteStyle, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(style.border);
    let mut lines = vec![Line::styled(
        preview.title.clone(),
        style.title.add_modifier(Modifier::BOLD),
    )];
    if let Some(description) = &preview.description {
        lines.push(Line::default());
        lines.push(Line::styled(description.clone(), style.description));
    }
    lines.push(Line::default());
    lines.push(detail("Category", &preview.category, style));
    if let Some(shortcut) = &preview.shortcut {
        lines.push(detail("Shortcut", shortcut, style));
    }
    lines.push(detail("Runs", &preview.runs.to_string(), style));
    if preview.favorite {
        lines.push(Line::styled(format!("{FAVORITE_ON} Favorite"), style.favorite));
    }
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn detail(label: &str, value: &str, style: &PaletteStyle) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), style.description),
        Span::styled(value.to_string(), style.title),
    ])
}

fn render_footer(hints: &[Hint], style: &PaletteStyle, frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();
    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", style.footer));
        }
        spans.push(Span::styled(
            hint.key.clone(),
            style.footer.add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(format!(" {}", hint.description), style.footer));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).style(Style::default()), area);
}

/// Cut `text` to at most `max` display columns.
fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    if max > 0 {
        out.push('…');
    }
    out
}
