//! One incremental batch: index page, then concurrent resolution

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::action::Action;
use crate::aggregator::Aggregator;
use crate::error::FetchError;
use crate::state::{BatchOutcome, BatchRequest};

/// Fetch the index page at `request` and resolve every reference on it.
///
/// Only the index fetch can fail the batch. Entries that fail to resolve are
/// counted in `failed` and left out; the rest arrive in completion order.
pub async fn fetch_batch(
    aggregator: &Aggregator,
    request: &BatchRequest,
    cancel: &CancellationToken,
) -> Result<BatchOutcome, FetchError> {
    let page = aggregator
        .api()
        .index_page(request.offset, request.limit, cancel)
        .await?;
    let reference_count = page.references.len();
    if reference_count == 0 {
        info!(offset = request.offset, "catalog exhausted");
        return Ok(BatchOutcome {
            offset: request.offset,
            limit: request.limit,
            reference_count,
            entries: Vec::new(),
            failed: 0,
        });
    }

    let resolved = aggregator.resolve_all(page.references, cancel).await;
    if cancel.is_cancelled() {
        return Err(FetchError::Aborted);
    }
    let failed = resolved.failed;
    let entries = resolved.into_completion_order();
    if failed > 0 {
        warn!(
            offset = request.offset,
            failed,
            resolved = entries.len(),
            "batch resolved with failures"
        );
    } else {
        info!(offset = request.offset, resolved = entries.len(), "batch resolved");
    }

    Ok(BatchOutcome {
        offset: request.offset,
        limit: request.limit,
        reference_count,
        entries,
        failed,
    })
}

/// Map a finished batch onto the action the reducer expects.
pub fn batch_action(offset: usize, result: Result<BatchOutcome, FetchError>) -> Action {
    match result {
        Ok(outcome) => Action::LoaderDidLoad(outcome),
        Err(error) if error.is_aborted() => Action::LoaderDidAbort { offset },
        Err(error) => Action::LoaderDidError {
            offset,
            error: error.to_string(),
        },
    }
}
