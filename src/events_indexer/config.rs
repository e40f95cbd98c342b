use serde::Deserialize;

use crate::{
    block_limit::{DEFAULT_BLOCK_PROCESS_LIMIT, DEFAULT_BLOCK_PROCESS_LIMIT_MAX},
    events_indexer::processed_cache::DEFAULT_PROCESSED_CACHE_CAPACITY,
};

/// Default number of trailing blocks the scheduler scans again on every run.
pub const DEFAULT_BLOCKS_TO_REINDEX_AGAIN: u64 = 10;
/// Default maximum number of addresses per log query.
pub const DEFAULT_QUERY_CHUNK_SIZE: usize = 1_000;
/// Default maximum number of log queries in flight.
pub const DEFAULT_GET_LOGS_CONCURRENCY: usize = 20;
/// Default distance, in blocks, after which the scheduler treats an address as outdated.
pub const DEFAULT_UPDATED_BLOCKS_BEHIND: u64 = 24 * 60 * 60 / 15;

/// Tuning of an events indexer.
///
/// Deserializable so it can be embedded in the configuration of the service running the
/// indexer; missing fields take their default.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Initial number of blocks processed per call.
    pub block_process_limit: u64,
    /// Upper bound for the adaptive block limit, `0` for none.
    pub block_process_limit_max: u64,
    /// Trailing blocks scanned again on every run to pick up reorged events. Read by the
    /// scheduler.
    pub blocks_to_reindex_again: u64,
    /// Maximum number of addresses per log query, `0` for no limit.
    pub query_chunk_size: usize,
    /// Maximum number of log queries in flight.
    pub get_logs_concurrency: usize,
    /// Scheduler hint for prioritizing outdated addresses. Not used by the indexer itself.
    pub updated_blocks_behind: u64,
    /// Query every contract emitting the registered events instead of the monitored addresses.
    pub ignore_addresses_on_log_filter: bool,
    /// Number of event identities remembered for deduplication.
    pub processed_cache_capacity: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            block_process_limit: DEFAULT_BLOCK_PROCESS_LIMIT,
            block_process_limit_max: DEFAULT_BLOCK_PROCESS_LIMIT_MAX,
            blocks_to_reindex_again: DEFAULT_BLOCKS_TO_REINDEX_AGAIN,
            query_chunk_size: DEFAULT_QUERY_CHUNK_SIZE,
            get_logs_concurrency: DEFAULT_GET_LOGS_CONCURRENCY,
            updated_blocks_behind: DEFAULT_UPDATED_BLOCKS_BEHIND,
            ignore_addresses_on_log_filter: false,
            processed_cache_capacity: DEFAULT_PROCESSED_CACHE_CAPACITY,
        }
    }
}
