//! Query matching and ranking.
//!
//! [`search`] is a pure function of the command list, the query, the active
//! category filter and the usage state. It never mutates anything; the
//! palette calls it again whenever one of its inputs changes.
//!
//! Fuzzy scores, computed on the lower-cased title:
//!
//! | Match | Score |
//! |-------|-------|
//! | title equals query | 1000 |
//! | title starts with query | 800 |
//! | title contains query | 600 |
//! | query chars appear in order | `400 / len(query)` per char, +50 per char right after the previous match, capped below 600 |
//!
//! Anything else is excluded.

use crate::config::{PaletteConfig, SearchStrategy};
use crate::descriptor::CommandDescriptor;
use crate::usage::UsageStore;
use std::cmp::Ordering;

/// Score for a title equal to the query.
pub const EXACT_SCORE: f64 = 1000.0;
/// Score for a title starting with the query.
pub const PREFIX_SCORE: f64 = 800.0;
/// Score for a title containing the query.
pub const SUBSTRING_SCORE: f64 = 600.0;
/// Budget shared by the characters of a subsequence match.
pub const SUBSEQUENCE_BUDGET: f64 = 400.0;
/// Bonus for a subsequence character adjacent to the previous match.
pub const ADJACENCY_BONUS: f64 = 50.0;
const SUBSEQUENCE_CAP: f64 = SUBSTRING_SCORE - 1.0;

/// Which slice of the command list is being browsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    /// Every category.
    #[default]
    All,
    /// Favorited commands only.
    Favorites,
    /// Recently executed commands only.
    Recent,
    /// Commands whose category key equals this one.
    Named(String),
}

impl CategoryFilter {
    /// Parse a category key; `"all"`, `"favorites"` and `"recent"` are reserved.
    pub fn from_key(key: &str) -> Self {
        match key {
            "all" => CategoryFilter::All,
            "favorites" => CategoryFilter::Favorites,
            "recent" => CategoryFilter::Recent,
            other => CategoryFilter::Named(other.to_string()),
        }
    }

    /// The key this filter was parsed from.
    pub fn key(&self) -> &str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Favorites => "favorites",
            CategoryFilter::Recent => "recent",
            CategoryFilter::Named(key) => key,
        }
    }
}

/// Search knobs taken from [`PaletteConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Matching strategy.
    pub strategy: SearchStrategy,
    /// Result cap.
    pub max_results: usize,
    /// Break score ties by usage before insertion order.
    pub usage_tiebreak: bool,
    /// With no query and no recents under `All`, list everything.
    pub all_when_no_recents: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&PaletteConfig::default())
    }
}

impl From<&PaletteConfig> for SearchOptions {
    fn from(config: &PaletteConfig) -> Self {
        Self {
            strategy: config.search,
            max_results: config.max_results,
            usage_tiebreak: config.features.usage_tiebreak,
            all_when_no_recents: config.features.all_when_no_recents,
        }
    }
}

/// One entry of the filtered result list.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    /// Position of the command in the list that was searched.
    pub index: usize,
    /// Command id.
    pub id: String,
    /// Match score; 0 when no query is active or for the simple strategy.
    pub score: f64,
    /// Char indices of the title that matched, for highlighting.
    pub positions: Vec<usize>,
}

/// A fuzzy match of a query against one title.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    /// Score per the table in the module docs.
    pub score: f64,
    /// Matched char indices in the title.
    pub positions: Vec<usize>,
}

fn fold(text: &str) -> Vec<char> {
    // One char in, one char out, so positions stay valid for the original title.
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Score `query` against `title`. `None` when the query does not match.
pub fn fuzzy_score(title: &str, query: &str) -> Option<FuzzyMatch> {
    let title = fold(title);
    let query = fold(query);
    if query.is_empty() {
        return None;
    }

    let span = |start: usize| (start..start + query.len()).collect::<Vec<_>>();
    if title == query {
        return Some(FuzzyMatch {
            score: EXACT_SCORE,
            positions: span(0),
        });
    }
    if title.starts_with(&query) {
        return Some(FuzzyMatch {
            score: PREFIX_SCORE,
            positions: span(0),
        });
    }
    if let Some(start) = find_chars(&title, &query) {
        return Some(FuzzyMatch {
            score: SUBSTRING_SCORE,
            positions: span(start),
        });
    }

    let per_char = SUBSEQUENCE_BUDGET / query.len() as f64;
    let mut score = 0.0;
    let mut positions = Vec::with_capacity(query.len());
    let mut last: Option<usize> = None;
    let mut next = 0;
    for (i, c) in title.iter().enumerate() {
        if next == query.len() {
            break;
        }
        if *c == query[next] {
            score += per_char;
            if last.is_some_and(|l| l + 1 == i) {
                score += ADJACENCY_BONUS;
            }
            last = Some(i);
            positions.push(i);
            next += 1;
        }
    }
    if next < query.len() {
        return None;
    }
    Some(FuzzyMatch {
        score: score.min(SUBSEQUENCE_CAP),
        positions,
    })
}

/// Case-insensitive substring match on title, description or keywords.
/// Returns the highlighted title positions (empty when only the description
/// or a keyword matched).
pub fn simple_match(cmd: &CommandDescriptor, query: &str) -> Option<Vec<usize>> {
    let query = fold(query);
    if query.is_empty() {
        return None;
    }
    if let Some(start) = find_chars(&fold(&cmd.title), &query) {
        return Some((start..start + query.len()).collect());
    }
    let in_description = cmd
        .description
        .as_deref()
        .is_some_and(|d| find_chars(&fold(d), &query).is_some());
    let in_keywords = cmd
        .keywords
        .iter()
        .any(|k| find_chars(&fold(k), &query).is_some());
    (in_description || in_keywords).then(Vec::new)
}

/// Produce the filtered, ordered result list.
pub fn search(
    commands: &[CommandDescriptor],
    query: &str,
    filter: &CategoryFilter,
    usage: &UsageStore,
    options: &SearchOptions,
) -> Vec<Ranked> {
    let query = query.trim();
    let mut results = if query.is_empty() {
        browse(commands, filter, usage, options)
    } else {
        matches(commands, query, filter, usage, options)
    };
    results.truncate(options.max_results);
    results
}

fn unscored(index: usize, cmd: &CommandDescriptor) -> Ranked {
    Ranked {
        index,
        id: cmd.id.clone(),
        score: 0.0,
        positions: Vec::new(),
    }
}

fn by_recents(commands: &[CommandDescriptor], usage: &UsageStore) -> Vec<Ranked> {
    usage
        .recent()
        .iter()
        .filter_map(|id| {
            commands
                .iter()
                .position(|c| &c.id == id)
                .map(|index| unscored(index, &commands[index]))
        })
        .collect()
}

fn keep(commands: &[CommandDescriptor], pred: impl Fn(&CommandDescriptor) -> bool) -> Vec<Ranked> {
    commands
        .iter()
        .enumerate()
        .filter(|(_, c)| pred(c))
        .map(|(i, c)| unscored(i, c))
        .collect()
}

fn browse(
    commands: &[CommandDescriptor],
    filter: &CategoryFilter,
    usage: &UsageStore,
    options: &SearchOptions,
) -> Vec<Ranked> {
    match filter {
        CategoryFilter::All => {
            let recents = by_recents(commands, usage);
            if recents.is_empty() && options.all_when_no_recents {
                keep(commands, |_| true)
            } else {
                recents
            }
        }
        CategoryFilter::Recent => by_recents(commands, usage),
        CategoryFilter::Favorites => keep(commands, |c| usage.is_favorite(&c.id)),
        CategoryFilter::Named(key) => keep(commands, |c| &c.category == key),
    }
}

fn matches(
    commands: &[CommandDescriptor],
    query: &str,
    filter: &CategoryFilter,
    usage: &UsageStore,
    options: &SearchOptions,
) -> Vec<Ranked> {
    let in_filter = |c: &CommandDescriptor| match filter {
        CategoryFilter::All => true,
        CategoryFilter::Favorites => usage.is_favorite(&c.id),
        CategoryFilter::Recent => usage.recency_rank(&c.id).is_some(),
        CategoryFilter::Named(key) => &c.category == key,
    };

    let mut ranked: Vec<Ranked> = commands
        .iter()
        .enumerate()
        .filter_map(|(index, cmd)| {
            let (score, positions) = match options.strategy {
                SearchStrategy::Fuzzy => {
                    let m = fuzzy_score(&cmd.title, query)?;
                    (m.score, m.positions)
                }
                SearchStrategy::Simple => (0.0, simple_match(cmd, query)?),
            };
            Some(Ranked {
                index,
                id: cmd.id.clone(),
                score,
                positions,
            })
        })
        .filter(|r| in_filter(&commands[r.index]))
        .collect();

    if options.strategy == SearchStrategy::Fuzzy {
        // `sort_by` is stable: equal keys keep insertion order.
        ranked.sort_by(|a, b| {
            let by_score = b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal);
            if by_score != Ordering::Equal || !options.usage_tiebreak {
                return by_score;
            }
            usage_order(usage, &a.id, &b.id)
        });
    }

    // Favorites stay listed even when the query misses them; matches come first.
    if *filter == CategoryFilter::Favorites {
        let missed = keep(commands, |c| {
            usage.is_favorite(&c.id) && !ranked.iter().any(|r| r.id == c.id)
        });
        ranked.extend(missed);
    }
    ranked
}

fn usage_order(usage: &UsageStore, a: &str, b: &str) -> Ordering {
    let fav = usage.is_favorite(b).cmp(&usage.is_favorite(a));
    let rank = |id: &str| usage.recency_rank(id).unwrap_or(usize::MAX);
    fav.then_with(|| rank(a).cmp(&rank(b)))
        .then_with(|| usage.frequency(b).cmp(&usage.frequency(a)))
}

/// Reorder results so commands of one category are contiguous.
///
/// Categories appear in order of their best-ranked command; order within a
/// category is preserved. The flat index of the returned list is the one the
/// keyboard navigates, so display order and selection order agree.
pub fn group_by_category(results: Vec<Ranked>, commands: &[CommandDescriptor]) -> Vec<Ranked> {
    let mut order: Vec<&str> = Vec::new();
    for r in &results {
        let category = commands[r.index].category.as_str();
        if !order.contains(&category) {
            order.push(category);
        }
    }
    let mut grouped = Vec::with_capacity(results.len());
    for category in order {
        grouped.extend(
            results
                .iter()
                .filter(|r| commands[r.index].category == category)
                .cloned(),
        );
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn usage() -> UsageStore {
        UsageStore::load(MemoryStore::new())
    }

    fn cmds(entries: &[(&str, &str)]) -> Vec<CommandDescriptor> {
        entries
            .iter()
            .map(|(id, title)| CommandDescriptor::new(*id, *title))
            .collect()
    }

    fn ids(results: &[Ranked]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    fn run(commands: &[CommandDescriptor], query: &str, filter: &CategoryFilter, usage: &UsageStore) -> Vec<Ranked> {
        search(commands, query, filter, usage, &SearchOptions::default())
    }

    #[test]
    fn prefix_ties_keep_insertion_order() {
        let commands = cmds(&[("a", "Open File"), ("b", "Open Folder"), ("c", "Close File")]);
        let results = run(&commands, "open", &CategoryFilter::All, &usage());
        assert_eq!(ids(&results), ["a", "b"]);
        assert!(results.iter().all(|r| r.score == PREFIX_SCORE));
    }

    #[test]
    fn subsequence_match_scores_per_char() {
        let m = fuzzy_score("x1y2z3", "xyz").unwrap();
        assert!((m.score - 400.0).abs() < 1e-9);
        assert_eq!(m.positions, vec![0, 2, 4]);
    }

    #[test]
    fn subsequence_adds_adjacency_bonus() {
        // o(0) p(1) are adjacent, f(5) is not.
        let m = fuzzy_score("Open File", "opf").unwrap();
        assert_eq!(m.positions, vec![0, 1, 5]);
        assert!((m.score - (400.0 / 3.0 + ADJACENCY_BONUS)).abs() < 1e-9);
        assert!(m.score < SUBSTRING_SCORE);
    }

    #[test]
    fn unmatched_subsequence_is_excluded() {
        assert!(fuzzy_score("Open File", "xyz").is_none());
        assert!(fuzzy_score("Open File", "fo").is_none());
    }

    #[test]
    fn tiers_rank_strictly() {
        let commands = cmds(&[
            ("sub", "Build the docs"),
            ("seq", "d-o-c-s"),
            ("pre", "Docs server"),
            ("exact", "docs"),
        ]);
        let results = run(&commands, "docs", &CategoryFilter::All, &usage());
        assert_eq!(ids(&results), ["exact", "pre", "sub", "seq"]);
        let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
        assert!(scores.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn long_subsequence_stays_below_substring() {
        let m = fuzzy_score("abcdefgh ij", "abcdefghj").unwrap();
        assert!(m.score < SUBSTRING_SCORE);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let m = fuzzy_score("OPEN", "open").unwrap();
        assert_eq!(m.score, EXACT_SCORE);
    }

    #[test]
    fn empty_commands_empty_result() {
        assert!(run(&[], "open", &CategoryFilter::All, &usage()).is_empty());
        assert!(run(&[], "", &CategoryFilter::All, &usage()).is_empty());
    }

    #[test]
    fn no_query_all_shows_recents_in_recency_order() {
        let commands = cmds(&[("a", "Alpha"), ("b", "Beta"), ("c", "Gamma")]);
        let mut usage = usage();
        usage.record_execution("c");
        usage.record_execution("a");
        let results = run(&commands, "", &CategoryFilter::All, &usage);
        assert_eq!(ids(&results), ["a", "c"]);
    }

    #[test]
    fn no_query_without_recents_can_list_everything() {
        let commands = cmds(&[("a", "Alpha"), ("b", "Beta")]);
        let opts = SearchOptions {
            all_when_no_recents: true,
            ..SearchOptions::default()
        };
        let results = search(&commands, "  ", &CategoryFilter::All, &usage(), &opts);
        assert_eq!(ids(&results), ["a", "b"]);
        assert!(run(&commands, "", &CategoryFilter::All, &usage()).is_empty());
    }

    #[test]
    fn named_category_is_exclusive_for_every_query() {
        let commands = vec![
            CommandDescriptor::new("a", "Open File").category("files"),
            CommandDescriptor::new("b", "Open Settings").category("settings"),
            CommandDescriptor::new("c", "Save File").category("files"),
        ];
        let filter = CategoryFilter::Named("files".into());
        for query in ["", "open", "file", "zz", "o"] {
            let results = run(&commands, query, &filter, &usage());
            assert!(results
                .iter()
                .all(|r| commands[r.index].category == "files"));
        }
        assert_eq!(ids(&run(&commands, "", &filter, &usage())), ["a", "c"]);
    }

    #[test]
    fn favorites_view_ignores_query_misses() {
        let commands = cmds(&[("a", "Open File"), ("b", "Open Folder"), ("c", "Close File")]);
        let mut usage = usage();
        usage.toggle_favorite("b");
        for query in ["", "open", "folder", "nothing-matches"] {
            let results = run(&commands, query, &CategoryFilter::Favorites, &usage);
            assert_eq!(ids(&results), ["b"], "query {query:?}");
        }
    }

    #[test]
    fn recent_view_filters_by_query() {
        let commands = cmds(&[("a", "Open File"), ("b", "Close File")]);
        let mut usage = usage();
        usage.record_execution("a");
        usage.record_execution("b");
        assert_eq!(ids(&run(&commands, "", &CategoryFilter::Recent, &usage)), ["b", "a"]);
        assert_eq!(ids(&run(&commands, "close", &CategoryFilter::Recent, &usage)), ["b"]);
    }

    #[test]
    fn simple_strategy_matches_description_and_keeps_order() {
        let commands = vec![
            CommandDescriptor::new("a", "Zeta").description("opens things"),
            CommandDescriptor::new("b", "Open"),
            CommandDescriptor::new("c", "Other").keywords(["reopen"]),
            CommandDescriptor::new("d", "Nothing"),
        ];
        let opts = SearchOptions {
            strategy: SearchStrategy::Simple,
            ..SearchOptions::default()
        };
        let results = search(&commands, "open", &CategoryFilter::All, &usage(), &opts);
        assert_eq!(ids(&results), ["a", "b", "c"]);
        assert!(results[0].positions.is_empty());
        assert_eq!(results[1].positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn usage_tiebreak_prefers_favorites_then_recents() {
        let commands = cmds(&[("a", "Open A"), ("b", "Open B"), ("c", "Open C")]);
        let mut usage = usage();
        usage.record_execution("b");
        usage.toggle_favorite("c");
        let opts = SearchOptions {
            usage_tiebreak: true,
            ..SearchOptions::default()
        };
        let results = search(&commands, "open", &CategoryFilter::All, &usage, &opts);
        assert_eq!(ids(&results), ["c", "b", "a"]);
    }

    #[test]
    fn max_results_truncates() {
        let commands: Vec<_> = (0..10)
            .map(|i| CommandDescriptor::new(format!("c{i}"), format!("Item {i}")))
            .collect();
        let opts = SearchOptions {
            max_results: 3,
            ..SearchOptions::default()
        };
        assert_eq!(search(&commands, "item", &CategoryFilter::All, &usage(), &opts).len(), 3);
    }

    #[test]
    fn grouping_makes_categories_contiguous() {
        let commands = vec![
            CommandDescriptor::new("a", "Open File").category("files"),
            CommandDescriptor::new("b", "Open Settings").category("settings"),
            CommandDescriptor::new("c", "Open Recent").category("files"),
        ];
        let results = run(&commands, "open", &CategoryFilter::All, &usage());
        assert_eq!(ids(&results), ["a", "b", "c"]);
        let grouped = group_by_category(results, &commands);
        assert_eq!(ids(&grouped), ["a", "c", "b"]);
    }

    #[test]
    fn category_filter_keys_round_trip() {
        for key in ["all", "favorites", "recent", "files"] {
            assert_eq!(CategoryFilter::from_key(key).key(), key);
        }
    }
}
