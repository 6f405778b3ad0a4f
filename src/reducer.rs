use tui_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::state::{AppState, BatchOutcome};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => {
            state.message = None;
            match state.loader.begin_fetch() {
                Some(request) => DispatchResult::changed_with(Effect::FetchBatch(request)),
                None => DispatchResult::changed(),
            }
        }

        Action::LoaderFetchNext => match state.loader.begin_fetch() {
            Some(request) => DispatchResult::changed_with(Effect::FetchBatch(request)),
            None => DispatchResult::unchanged(),
        },

        Action::LoaderRetry => match state.loader.begin_retry() {
            Some(request) => {
                state.message = None;
                DispatchResult::changed_with(Effect::FetchBatch(request))
            }
            None => DispatchResult::unchanged(),
        },

        Action::LoaderDidLoad(outcome) => loader_did_load(state, outcome),

        Action::LoaderDidError { offset, error } => {
            if !state.loader.fail(offset, error) {
                return DispatchResult::unchanged();
            }
            state.message = Some("Could not load more entries (press r to retry)".to_string());
            DispatchResult::changed()
        }

        Action::LoaderDidAbort { offset } => {
            if !state.loader.abort(offset) {
                return DispatchResult::unchanged();
            }
            DispatchResult::changed()
        }

        Action::SearchStart => {
            if state.search.active {
                return DispatchResult::unchanged();
            }
            state.search.active = true;
            DispatchResult::changed()
        }

        Action::SearchCancel => {
            if !state.search.active && state.search.query.is_empty() && !state.search.is_searching()
            {
                return DispatchResult::unchanged();
            }
            state.search.clear();
            state.selected_index = 0;
            state.clamp_selection();
            DispatchResult::changed_with(Effect::CancelSearch)
        }

        Action::SearchSubmit => {
            if !state.search.active {
                return DispatchResult::unchanged();
            }
            state.search.active = false;
            DispatchResult::changed()
        }

        Action::SearchInput(ch) => {
            let mut query = state.search.query.clone();
            query.push(ch);
            change_query(state, query)
        }

        Action::SearchBackspace => {
            let mut query = state.search.query.clone();
            if query.pop().is_none() {
                return DispatchResult::unchanged();
            }
            change_query(state, query)
        }

        Action::SearchQueryChange(query) => change_query(state, query),

        Action::SearchDidLoad { term, results } => {
            if !state.search.accept(&term, results) {
                return DispatchResult::unchanged();
            }
            state.clamp_selection();
            DispatchResult::changed()
        }

        Action::SearchDidError { term, error } => {
            if !state.search.reject(&term, error) {
                return DispatchResult::unchanged();
            }
            state.clamp_selection();
            DispatchResult::changed()
        }

        Action::SearchDidAbort { term } => {
            if term != state.search.term || !state.search.loading {
                return DispatchResult::unchanged();
            }
            state.search.loading = false;
            DispatchResult::changed()
        }

        Action::SelectionMove(delta) => {
            let index = (state.selected_index as i64 + delta as i64).max(0) as usize;
            select(state, index)
        }

        Action::SelectionPage(delta) => {
            let page = state.list_page_size() as i64;
            let index = (state.selected_index as i64 + delta as i64 * page).max(0) as usize;
            select(state, index)
        }

        Action::SelectionJumpTop => select(state, 0),

        Action::SelectionJumpBottom => {
            let last = state.visible_entries().len().saturating_sub(1);
            select(state, last)
        }

        Action::EntrySelect(index) => select(state, index),

        Action::DetailTabNext => {
            state.detail_tab = state.detail_tab.next();
            DispatchResult::changed()
        }

        Action::DetailTabPrev => {
            state.detail_tab = state.detail_tab.prev();
            DispatchResult::changed()
        }

        Action::UiTerminalResize(width, height) => {
            if state.terminal_size != (width, height) {
                state.terminal_size = (width, height);
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::Tick => {
            state.tick = state.tick.wrapping_add(1);
            if state.loader.is_loading() || state.search.loading {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::Quit => DispatchResult::unchanged(),
    }
}

fn loader_did_load(state: &mut AppState, outcome: BatchOutcome) -> DispatchResult<Effect> {
    let failed = outcome.failed;
    if !state.loader.complete(outcome) {
        return DispatchResult::unchanged();
    }
    state.clamp_selection();
    state.message = match failed {
        0 => None,
        1 => Some("1 entry could not be loaded".to_string()),
        n => Some(format!("{n} entries could not be loaded")),
    };
    match next_batch(state) {
        Some(effect) => DispatchResult::changed_with(effect),
        None => DispatchResult::changed(),
    }
}

fn change_query(state: &mut AppState, query: String) -> DispatchResult<Effect> {
    if query == state.search.query {
        return DispatchResult::unchanged();
    }
    let Some(term) = state.search.request(query) else {
        return DispatchResult::changed();
    };
    state.selected_index = 0;
    if term.is_empty() {
        DispatchResult::changed_with(Effect::CancelSearch)
    } else {
        DispatchResult::changed_with(Effect::SearchCatalog { term })
    }
}

fn select(state: &mut AppState, index: usize) -> DispatchResult<Effect> {
    let moved = state.set_selected_index(index);
    match next_batch(state) {
        Some(effect) => DispatchResult::changed_with(effect),
        None if moved => DispatchResult::changed(),
        None => DispatchResult::unchanged(),
    }
}

/// Scroll sentinel: request the next batch once the selection nears the end.
fn next_batch(state: &mut AppState) -> Option<Effect> {
    if !state.wants_next_batch() {
        return None;
    }
    state.loader.begin_fetch().map(Effect::FetchBatch)
}
