use serde::{Deserialize, Serialize};
use tui_dispatch_debug::debug::{ron_string, DebugSection, DebugState};

use crate::config::DEFAULT_BATCH_SIZE;

/// Rows from the end of the loaded list at which the next batch is requested.
pub const SCROLL_SENTINEL_ROWS: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogReference {
    pub name: String,
    pub url: String,
}

impl CatalogReference {
    pub fn id(&self) -> Option<u32> {
        crate::api::reference_id(&self.url)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: Option<u16>,
    pub attack: Option<u16>,
    pub defense: Option<u16>,
    pub special_attack: Option<u16>,
    pub special_defense: Option<u16>,
    pub speed: Option<u16>,
}

impl BaseStats {
    pub fn entries(&self) -> [(&'static str, Option<u16>); 6] {
        [
            ("HP", self.hp),
            ("Attack", self.attack),
            ("Defense", self.defense),
            ("Sp. Atk", self.special_attack),
            ("Sp. Def", self.special_defense),
            ("Speed", self.speed),
        ]
    }

    /// Sum of the stats that are present.
    pub fn total(&self) -> u16 {
        self.entries()
            .iter()
            .filter_map(|(_, value)| *value)
            .sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolutionStep {
    pub species_name: String,
    pub min_level: Option<u16>,
    pub trigger_name: Option<String>,
    pub item: Option<String>,
    pub image: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveSummary {
    pub name: String,
    pub level_learned_at: Option<u16>,
    pub learn_method: Option<String>,
    pub target: Option<String>,
    pub power: Option<u16>,
    pub pp: Option<u16>,
    pub accuracy: Option<u16>,
}

/// Fully resolved catalog record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u32,
    pub name: String,
    pub image: String,
    pub fallback_image: String,
    pub types: Vec<String>,
    pub description: String,
    pub habitat: String,
    pub shape: String,
    pub egg_groups: String,
    pub height: u16,
    pub weight: u16,
    pub capture_rate: u8,
    pub location: String,
    pub varieties: String,
    pub japanese_name: String,
    pub romaji_name: String,
    pub is_baby: bool,
    pub is_mythical: bool,
    pub is_legendary: bool,
    pub stats: BaseStats,
    pub evolutions: Vec<EvolutionStep>,
    pub moves: Vec<MoveSummary>,
    pub total_moves: usize,
}

// ============================================================================
// Incremental loader
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoaderPhase {
    #[default]
    Idle,
    Fetching,
    Exhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub offset: usize,
    pub limit: usize,
}

/// Result of one completed batch: successes in completion order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub offset: usize,
    pub limit: usize,
    pub reference_count: usize,
    pub entries: Vec<CatalogEntry>,
    pub failed: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoaderState {
    pub items: Vec<CatalogEntry>,
    pub cursor: usize,
    pub batch_size: usize,
    pub phase: LoaderPhase,
    pub has_more: bool,
    pub failure: Option<String>,
}

impl Default for LoaderState {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl LoaderState {
    pub fn new(batch_size: usize) -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
            batch_size: batch_size.max(1),
            phase: LoaderPhase::Idle,
            has_more: true,
            failure: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoaderPhase::Fetching
    }

    pub fn can_fetch(&self) -> bool {
        self.phase == LoaderPhase::Idle && self.has_more
    }

    /// Idle -> Fetching. `None` while a batch is in flight or once exhausted.
    pub fn begin_fetch(&mut self) -> Option<BatchRequest> {
        if !self.can_fetch() {
            return None;
        }
        self.phase = LoaderPhase::Fetching;
        Some(self.current_request())
    }

    /// Re-request the batch at the cursor after a batch-level failure.
    pub fn begin_retry(&mut self) -> Option<BatchRequest> {
        if self.phase != LoaderPhase::Exhausted || self.failure.is_none() {
            return None;
        }
        self.failure = None;
        self.phase = LoaderPhase::Fetching;
        Some(self.current_request())
    }

    /// Apply a finished batch. Returns false for a batch that is not the one
    /// in flight; its entries are discarded.
    pub fn complete(&mut self, outcome: BatchOutcome) -> bool {
        if !self.is_in_flight(outcome.offset) {
            return false;
        }
        if outcome.reference_count == 0 {
            self.has_more = false;
            self.phase = LoaderPhase::Exhausted;
            return true;
        }
        self.cursor += outcome.limit;
        self.phase = LoaderPhase::Idle;
        self.merge(outcome.entries);
        true
    }

    pub fn fail(&mut self, offset: usize, error: String) -> bool {
        if !self.is_in_flight(offset) {
            return false;
        }
        self.phase = LoaderPhase::Exhausted;
        self.failure = Some(error);
        true
    }

    /// The in-flight batch was cancelled; the cursor stays where it was.
    pub fn abort(&mut self, offset: usize) -> bool {
        if !self.is_in_flight(offset) {
            return false;
        }
        self.phase = LoaderPhase::Idle;
        true
    }

    /// Append new ids, replace existing ids in place. Returns the number added.
    pub fn merge(&mut self, entries: Vec<CatalogEntry>) -> usize {
        let mut added = 0;
        for entry in entries {
            match self.items.iter_mut().find(|item| item.id == entry.id) {
                Some(existing) => *existing = entry,
                None => {
                    self.items.push(entry);
                    added += 1;
                }
            }
        }
        added
    }

    fn is_in_flight(&self, offset: usize) -> bool {
        self.phase == LoaderPhase::Fetching && self.cursor == offset
    }

    fn current_request(&self) -> BatchRequest {
        BatchRequest {
            offset: self.cursor,
            limit: self.batch_size,
        }
    }
}

// ============================================================================
// Search overlay
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    /// Search input has focus
    pub active: bool,
    /// Text as typed
    pub query: String,
    /// Latest requested term; only results for this term are committed
    pub term: String,
    pub results: Vec<CatalogEntry>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SearchState {
    pub fn is_searching(&self) -> bool {
        !self.term.is_empty()
    }

    /// Record new input. Returns the term to resolve when it changed.
    pub fn request(&mut self, query: String) -> Option<String> {
        let term = query.trim().to_string();
        self.query = query;
        if term == self.term {
            return None;
        }
        self.term = term.clone();
        self.error = None;
        self.results.clear();
        if term.is_empty() {
            self.loading = false;
        } else {
            self.loading = true;
        }
        Some(term)
    }

    pub fn accept(&mut self, term: &str, results: Vec<CatalogEntry>) -> bool {
        if term != self.term || term.is_empty() {
            return false;
        }
        self.results = results;
        self.loading = false;
        self.error = None;
        true
    }

    pub fn reject(&mut self, term: &str, error: String) -> bool {
        if term != self.term || term.is_empty() {
            return false;
        }
        self.results.clear();
        self.loading = false;
        self.error = Some(error);
        true
    }

    pub fn clear(&mut self) {
        self.active = false;
        self.query.clear();
        self.term.clear();
        self.results.clear();
        self.loading = false;
        self.error = None;
    }
}

// ============================================================================
// App state
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailTab {
    #[default]
    About,
    Stats,
    Evolution,
    Moves,
}

impl DetailTab {
    pub const ALL: [DetailTab; 4] = [
        DetailTab::About,
        DetailTab::Stats,
        DetailTab::Evolution,
        DetailTab::Moves,
    ];

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|tab| *tab == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            DetailTab::About => "About",
            DetailTab::Stats => "Stats",
            DetailTab::Evolution => "Evolution",
            DetailTab::Moves => "Moves",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppState {
    pub terminal_size: (u16, u16),
    pub loader: LoaderState,
    pub search: SearchState,
    pub selected_index: usize,
    pub detail_tab: DetailTab,
    pub message: Option<String>,
    pub tick: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl AppState {
    pub fn new(batch_size: usize) -> Self {
        Self {
            terminal_size: (80, 24),
            loader: LoaderState::new(batch_size),
            search: SearchState::default(),
            selected_index: 0,
            detail_tab: DetailTab::default(),
            message: None,
            tick: 0,
        }
    }

    /// Search results while a term is set, the loader list otherwise.
    pub fn visible_entries(&self) -> &[CatalogEntry] {
        if self.search.is_searching() {
            &self.search.results
        } else {
            &self.loader.items
        }
    }

    pub fn selected_entry(&self) -> Option<&CatalogEntry> {
        self.visible_entries().get(self.selected_index)
    }

    pub fn set_selected_index(&mut self, index: usize) -> bool {
        let len = self.visible_entries().len();
        if len == 0 {
            self.selected_index = 0;
            return false;
        }
        let bounded = index.min(len - 1);
        if bounded != self.selected_index {
            self.selected_index = bounded;
            return true;
        }
        false
    }

    pub fn clamp_selection(&mut self) {
        let len = self.visible_entries().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    /// Scroll sentinel: the selection is close enough to the end of the
    /// loader list that the next batch should be requested.
    pub fn wants_next_batch(&self) -> bool {
        if self.search.is_searching() || !self.loader.can_fetch() {
            return false;
        }
        self.selected_index + SCROLL_SENTINEL_ROWS >= self.loader.items.len()
    }

    pub fn list_page_size(&self) -> usize {
        self.terminal_size.1.saturating_sub(8).max(1) as usize
    }
}

impl DebugState for AppState {
    fn debug_sections(&self) -> Vec<DebugSection> {
        vec![
            DebugSection::new("Loader")
                .entry("items", ron_string(&self.loader.items.len()))
                .entry("cursor", ron_string(&self.loader.cursor))
                .entry("batch_size", ron_string(&self.loader.batch_size))
                .entry("phase", ron_string(&self.loader.phase))
                .entry("has_more", ron_string(&self.loader.has_more))
                .entry("failure", ron_string(&self.loader.failure)),
            DebugSection::new("Search")
                .entry("active", ron_string(&self.search.active))
                .entry("query", ron_string(&self.search.query))
                .entry("term", ron_string(&self.search.term))
                .entry("results", ron_string(&self.search.results.len()))
                .entry("loading", ron_string(&self.search.loading))
                .entry("error", ron_string(&self.search.error)),
            DebugSection::new("View")
                .entry("selected", ron_string(&self.selected_index))
                .entry(
                    "entry",
                    ron_string(&self.selected_entry().map(|entry| entry.name.clone())),
                )
                .entry("tab", ron_string(&self.detail_tab))
                .entry("message", ron_string(&self.message)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, name: &str) -> CatalogEntry {
        CatalogEntry {
            id,
            name: name.to_string(),
            image: String::new(),
            fallback_image: String::new(),
            types: vec!["normal".into()],
            description: String::new(),
            habitat: "Unknown".into(),
            shape: "Unknown".into(),
            egg_groups: String::new(),
            height: 1,
            weight: 1,
            capture_rate: 45,
            location: String::new(),
            varieties: name.to_string(),
            japanese_name: "Unknown".into(),
            romaji_name: "Unknown".into(),
            is_baby: false,
            is_mythical: false,
            is_legendary: false,
            stats: BaseStats::default(),
            evolutions: Vec::new(),
            moves: Vec::new(),
            total_moves: 0,
        }
    }

    fn outcome(offset: usize, limit: usize, entries: Vec<CatalogEntry>) -> BatchOutcome {
        BatchOutcome {
            offset,
            limit,
            reference_count: entries.len(),
            entries,
            failed: 0,
        }
    }

    #[test]
    fn begin_fetch_is_guarded_while_fetching() {
        let mut loader = LoaderState::new(5);
        assert_eq!(loader.begin_fetch(), Some(BatchRequest { offset: 0, limit: 5 }));
        assert_eq!(loader.begin_fetch(), None);
        assert_eq!(loader.cursor, 0);
        assert!(loader.is_loading());
    }

    #[test]
    fn partial_batch_advances_by_full_batch_size() {
        let mut loader = LoaderState::new(5);
        loader.begin_fetch();
        let mut batch = outcome(0, 5, vec![entry(1, "a"), entry(2, "b"), entry(3, "c")]);
        batch.reference_count = 5;
        batch.failed = 2;
        assert!(loader.complete(batch));
        assert_eq!(loader.cursor, 5);
        assert_eq!(loader.items.len(), 3);
        assert_eq!(loader.phase, LoaderPhase::Idle);
    }

    #[test]
    fn empty_batch_exhausts_for_good() {
        let mut loader = LoaderState::new(5);
        loader.begin_fetch();
        assert!(loader.complete(outcome(0, 5, Vec::new())));
        assert!(!loader.has_more);
        assert_eq!(loader.phase, LoaderPhase::Exhausted);
        assert_eq!(loader.begin_fetch(), None);
        assert_eq!(loader.begin_retry(), None);
        assert!(!loader.has_more);
    }

    #[test]
    fn stale_outcome_is_discarded() {
        let mut loader = LoaderState::new(5);
        assert!(!loader.complete(outcome(0, 5, vec![entry(1, "a")])));
        loader.begin_fetch();
        assert!(!loader.complete(outcome(10, 5, vec![entry(1, "a")])));
        assert!(loader.items.is_empty());
        assert!(loader.is_loading());
    }

    #[test]
    fn merge_replaces_existing_ids_in_place() {
        let mut loader = LoaderState::new(5);
        loader.merge(vec![entry(1, "a"), entry(2, "b")]);
        let mut updated = entry(1, "a");
        updated.capture_rate = 3;
        let added = loader.merge(vec![updated, entry(3, "c")]);
        assert_eq!(added, 1);
        let ids: Vec<u32> = loader.items.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(loader.items[0].capture_rate, 3);
    }

    #[test]
    fn failure_then_retry_requests_same_cursor() {
        let mut loader = LoaderState::new(5);
        loader.begin_fetch();
        loader.complete(outcome(0, 5, vec![entry(1, "a")]));
        loader.begin_fetch();
        assert!(loader.fail(5, "http 500".into()));
        assert_eq!(loader.phase, LoaderPhase::Exhausted);
        assert!(loader.has_more);
        assert_eq!(loader.begin_fetch(), None);
        assert_eq!(loader.begin_retry(), Some(BatchRequest { offset: 5, limit: 5 }));
        assert!(loader.failure.is_none());
    }

    #[test]
    fn abort_returns_to_idle_without_advancing() {
        let mut loader = LoaderState::new(5);
        loader.begin_fetch();
        assert!(loader.abort(0));
        assert_eq!(loader.phase, LoaderPhase::Idle);
        assert_eq!(loader.cursor, 0);
    }

    #[test]
    fn search_request_tracks_latest_term() {
        let mut search = SearchState::default();
        assert_eq!(search.request("pika".into()), Some("pika".into()));
        assert_eq!(search.request("pika ".into()), None);
        assert_eq!(search.request("pikach".into()), Some("pikach".into()));
        assert!(!search.accept("pika", vec![entry(25, "pikachu")]));
        assert!(search.results.is_empty());
        assert!(search.accept("pikach", vec![entry(25, "pikachu")]));
        assert_eq!(search.results.len(), 1);
        assert!(!search.loading);
    }

    #[test]
    fn new_term_drops_previous_results() {
        let mut search = SearchState::default();
        search.request("pika".into());
        search.accept("pika", vec![entry(25, "pikachu"), entry(10080, "pikachu-rock-star")]);
        assert_eq!(search.results.len(), 2);
        assert_eq!(search.request("raichu".into()), Some("raichu".into()));
        assert!(search.results.is_empty());
        assert!(search.loading);
    }

    #[test]
    fn empty_term_clears_results() {
        let mut search = SearchState::default();
        search.request("25".into());
        search.accept("25", vec![entry(25, "pikachu")]);
        assert_eq!(search.request(String::new()), Some(String::new()));
        assert!(search.results.is_empty());
        assert!(!search.is_searching());
    }

    #[test]
    fn visible_entries_follow_search_mode() {
        let mut state = AppState::new(5);
        state.loader.merge(vec![entry(1, "bulbasaur"), entry(2, "ivysaur")]);
        assert_eq!(state.visible_entries().len(), 2);
        state.search.request("mew".into());
        assert!(state.visible_entries().is_empty());
        assert!(!state.wants_next_batch());
    }

    #[test]
    fn sentinel_fires_near_end_of_list() {
        let mut state = AppState::new(5);
        state
            .loader
            .merge((1..=10).map(|id| entry(id, "x")).collect());
        state.selected_index = 2;
        assert!(!state.wants_next_batch());
        state.selected_index = 7;
        assert!(state.wants_next_batch());
        state.loader.begin_fetch();
        assert!(!state.wants_next_batch());
    }

    #[test]
    fn detail_tab_cycles() {
        assert_eq!(DetailTab::About.next(), DetailTab::Stats);
        assert_eq!(DetailTab::Moves.next(), DetailTab::About);
        assert_eq!(DetailTab::About.prev(), DetailTab::Moves);
    }

    #[test]
    fn stats_total_skips_missing() {
        let stats = BaseStats {
            hp: Some(35),
            attack: Some(55),
            speed: None,
            ..BaseStats::default()
        };
        assert_eq!(stats.total(), 90);
        assert_eq!(stats.entries()[5], ("Speed", None));
    }
}
