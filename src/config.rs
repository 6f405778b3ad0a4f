//! Catalog configuration, shared by the CLI and tests

use std::time::Duration;

use clap::Args;

use crate::api::API_BASE;

pub const DEFAULT_BATCH_SIZE: usize = 13;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 12;
pub const DEFAULT_MOVE_CONCURRENCY: usize = 8;
pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 6;
pub const DEFAULT_INDEX_LIMIT: usize = 1500;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

/// Tunables for paging, fan-out and request limits.
#[derive(Args, Clone, Debug, PartialEq)]
pub struct CatalogConfig {
    /// PokeAPI base URL
    #[arg(long, default_value = API_BASE)]
    pub api_base: String,

    /// References requested per incremental batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub batch_size: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout_secs: u64,

    /// Skip the per-move detail requests (power, PP, accuracy, target)
    #[arg(long)]
    pub skip_move_details: bool,

    /// Concurrent move detail requests per entry
    #[arg(long, default_value_t = DEFAULT_MOVE_CONCURRENCY)]
    pub move_concurrency: usize,

    /// Concurrent entry resolutions per batch or search
    #[arg(long, default_value_t = DEFAULT_RESOLVE_CONCURRENCY)]
    pub resolve_concurrency: usize,

    /// Size of the reference index fetched for search
    #[arg(long, default_value_t = DEFAULT_INDEX_LIMIT)]
    pub index_limit: usize,

    /// Quiet period before a typed search term is resolved
    #[arg(long, default_value_t = DEFAULT_SEARCH_DEBOUNCE_MS)]
    pub search_debounce_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            skip_move_details: false,
            move_concurrency: DEFAULT_MOVE_CONCURRENCY,
            resolve_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
            index_limit: DEFAULT_INDEX_LIMIT,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
        }
    }
}

impl CatalogConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn api_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    pub(crate) fn move_permits(&self) -> usize {
        self.move_concurrency.max(1)
    }

    pub(crate) fn resolve_permits(&self) -> usize {
        self.resolve_concurrency.max(1)
    }
}
