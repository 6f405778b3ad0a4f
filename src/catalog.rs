//! Composition root for the catalog: owns the aggregator, the cached
//! reference index and the cancellation tokens for a run.

use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::aggregator::Aggregator;
use crate::api::{HttpClient, HttpSource, PokeApi};
use crate::config::CatalogConfig;
use crate::error::FetchError;
use crate::loader;
use crate::search;
use crate::state::{BatchOutcome, BatchRequest, CatalogEntry, CatalogReference};

#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    aggregator: Aggregator,
    config: CatalogConfig,
    index: OnceCell<Vec<CatalogReference>>,
    shutdown: CancellationToken,
    search_token: Mutex<CancellationToken>,
}

impl Catalog {
    pub fn new(source: Arc<dyn HttpSource>, config: CatalogConfig) -> Self {
        let api = PokeApi::new(source, &config);
        let aggregator = Aggregator::new(api, &config);
        let shutdown = CancellationToken::new();
        let search_token = Mutex::new(shutdown.child_token());
        Self {
            inner: Arc::new(CatalogInner {
                aggregator,
                config,
                index: OnceCell::new(),
                shutdown,
                search_token,
            }),
        }
    }

    /// Catalog backed by the real HTTP transport.
    pub fn from_config(config: CatalogConfig) -> Result<Self, FetchError> {
        let client = HttpClient::new(config.request_timeout())?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.inner.config
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.inner.aggregator
    }

    /// Fetch one incremental batch, cancelled on shutdown.
    pub async fn fetch_batch(&self, request: BatchRequest) -> Result<BatchOutcome, FetchError> {
        let cancel = self.inner.shutdown.child_token();
        loader::fetch_batch(&self.inner.aggregator, &request, &cancel).await
    }

    /// Token for a new search. The previous search token is cancelled.
    pub fn begin_search(&self) -> CancellationToken {
        let next = self.inner.shutdown.child_token();
        let mut current = self
            .inner
            .search_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        current.cancel();
        *current = next.clone();
        next
    }

    pub fn cancel_search(&self) {
        self.inner
            .search_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .cancel();
    }

    /// Resolve the entries matching `term`. The reference index is fetched on
    /// first use and kept for the rest of the run.
    pub async fn search(
        &self,
        term: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<CatalogEntry>, FetchError> {
        let index = self.reference_index(cancel).await?;
        search::search(&self.inner.aggregator, index, term, cancel).await
    }

    pub async fn reference_index(
        &self,
        cancel: &CancellationToken,
    ) -> Result<&[CatalogReference], FetchError> {
        let index = self
            .inner
            .index
            .get_or_try_init(|| async {
                let page = self
                    .inner
                    .aggregator
                    .api()
                    .index_page(0, self.inner.config.index_limit, cancel)
                    .await?;
                info!(references = page.references.len(), total = page.count, "reference index loaded");
                Ok::<_, FetchError>(page.references)
            })
            .await?;
        Ok(index.as_slice())
    }

    /// Cancel everything still in flight.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }
}
