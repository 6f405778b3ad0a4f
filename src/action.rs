use serde::{Deserialize, Serialize};

use crate::state::{BatchOutcome, CatalogEntry};

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[action(infer_categories)]
pub enum Action {
    Init,

    LoaderFetchNext,
    LoaderRetry,
    LoaderDidLoad(BatchOutcome),
    LoaderDidError { offset: usize, error: String },
    LoaderDidAbort { offset: usize },

    SearchStart,
    SearchCancel,
    SearchSubmit,
    SearchInput(char),
    SearchBackspace,
    SearchQueryChange(String),
    SearchDidLoad { term: String, results: Vec<CatalogEntry> },
    SearchDidError { term: String, error: String },
    SearchDidAbort { term: String },

    SelectionMove(i16),
    SelectionPage(i16),
    SelectionJumpTop,
    SelectionJumpBottom,
    EntrySelect(usize),

    DetailTabNext,
    DetailTabPrev,

    UiTerminalResize(u16, u16),
    Tick,
    Quit,
}
