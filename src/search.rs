//! Term matching over the reference index

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::action::Action;
use crate::aggregator::Aggregator;
use crate::error::FetchError;
use crate::state::{CatalogEntry, CatalogReference};

/// Case-insensitive substring match on the name, or an exact id match when
/// the term is numeric.
pub fn matches_term(reference: &CatalogReference, term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return false;
    }
    if reference
        .name
        .to_lowercase()
        .contains(&term.to_lowercase())
    {
        return true;
    }
    reference.id().is_some()
        && reference.url.trim_end_matches('/').rsplit('/').next() == Some(term)
}

/// Matching references, in index order.
pub fn filter_references(index: &[CatalogReference], term: &str) -> Vec<CatalogReference> {
    index
        .iter()
        .filter(|reference| matches_term(reference, term))
        .cloned()
        .collect()
}

/// Resolve every reference matching `term`. Results keep index order.
pub async fn search(
    aggregator: &Aggregator,
    index: &[CatalogReference],
    term: &str,
    cancel: &CancellationToken,
) -> Result<Vec<CatalogEntry>, FetchError> {
    let matches = filter_references(index, term);
    debug!(term = %term, matches = matches.len(), "search matched references");
    if matches.is_empty() {
        return Ok(Vec::new());
    }
    let resolved = aggregator.resolve_all(matches, cancel).await;
    if cancel.is_cancelled() {
        return Err(FetchError::Aborted);
    }
    Ok(resolved.into_input_order())
}

pub fn search_action(term: String, result: Result<Vec<CatalogEntry>, FetchError>) -> Action {
    match result {
        Ok(results) => Action::SearchDidLoad { term, results },
        Err(error) if error.is_aborted() => Action::SearchDidAbort { term },
        Err(error) => Action::SearchDidError {
            term,
            error: error.to_string(),
        },
    }
}
