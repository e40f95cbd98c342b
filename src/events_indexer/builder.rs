use std::sync::{Arc, Mutex, OnceLock};

use alloy::network::Network;

use crate::{
    IndexerError,
    block_limit::{AdaptiveBlockLimit, BlockRangeController},
    events_indexer::{
        EventsIndexer,
        config::IndexerConfig,
        fetcher::LogSource,
        handler::{ContractEventHandler, TransactionStore},
        processed_cache::ProcessedEventCache,
    },
    robust_provider::{IntoRobustProvider, RobustProvider},
};

/// Builder for [`EventsIndexer`].
///
/// Unless a controller is set with [`block_range_controller`](Self::block_range_controller), the
/// indexer reports to an [`AdaptiveBlockLimit`] seeded from `block_process_limit` and
/// `block_process_limit_max`.
#[derive(Clone, Default)]
pub struct EventsIndexerBuilder {
    config: IndexerConfig,
    controller: Option<Arc<dyn BlockRangeController>>,
}

impl EventsIndexerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(config: IndexerConfig) -> Self {
        Self { config, controller: None }
    }

    #[must_use]
    pub fn block_process_limit(mut self, block_process_limit: u64) -> Self {
        self.config.block_process_limit = block_process_limit;
        self
    }

    /// Upper bound for the adaptive block limit. `0` leaves it unbounded.
    #[must_use]
    pub fn block_process_limit_max(mut self, block_process_limit_max: u64) -> Self {
        self.config.block_process_limit_max = block_process_limit_max;
        self
    }

    #[must_use]
    pub fn blocks_to_reindex_again(mut self, blocks_to_reindex_again: u64) -> Self {
        self.config.blocks_to_reindex_again = blocks_to_reindex_again;
        self
    }

    /// Maximum number of addresses per log query. `0` sends all addresses in one query.
    #[must_use]
    pub fn query_chunk_size(mut self, query_chunk_size: usize) -> Self {
        self.config.query_chunk_size = query_chunk_size;
        self
    }

    /// Maximum number of log queries in flight.
    ///
    /// Must be greater than 0.
    #[must_use]
    pub fn get_logs_concurrency(mut self, get_logs_concurrency: usize) -> Self {
        self.config.get_logs_concurrency = get_logs_concurrency;
        self
    }

    #[must_use]
    pub fn updated_blocks_behind(mut self, updated_blocks_behind: u64) -> Self {
        self.config.updated_blocks_behind = updated_blocks_behind;
        self
    }

    #[must_use]
    pub fn ignore_addresses_on_log_filter(mut self, ignore: bool) -> Self {
        self.config.ignore_addresses_on_log_filter = ignore;
        self
    }

    /// Number of event identities remembered for deduplication.
    ///
    /// Must be greater than 0.
    #[must_use]
    pub fn processed_cache_capacity(mut self, capacity: usize) -> Self {
        self.config.processed_cache_capacity = capacity;
        self
    }

    /// Reports query outcomes to `controller` instead of the default adaptive limit.
    #[must_use]
    pub fn block_range_controller(mut self, controller: Arc<dyn BlockRangeController>) -> Self {
        self.controller = Some(controller);
        self
    }

    /// Connects to `provider` and builds an indexer querying it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the provider fails to connect.
    pub async fn connect<N, H, T>(
        self,
        provider: impl IntoRobustProvider<N>,
        handler: H,
        store: T,
    ) -> Result<EventsIndexer<H, RobustProvider<N>, T>, IndexerError>
    where
        N: Network,
        H: ContractEventHandler,
        T: TransactionStore,
    {
        self.validate()?;
        let provider = provider.into_robust_provider().await?;
        self.build(provider, handler, store)
    }

    /// Builds an indexer reading logs from `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build<H, S, T>(
        self,
        source: S,
        handler: H,
        store: T,
    ) -> Result<EventsIndexer<H, S, T>, IndexerError>
    where
        H: ContractEventHandler,
        S: LogSource,
        T: TransactionStore,
    {
        self.validate()?;

        let controller = self.controller.unwrap_or_else(|| {
            Arc::new(AdaptiveBlockLimit::new(
                self.config.block_process_limit,
                self.config.block_process_limit_max,
            ))
        });

        Ok(EventsIndexer {
            source,
            handler,
            store,
            controller,
            processed: Mutex::new(ProcessedEventCache::new(self.config.processed_cache_capacity)),
            registry: OnceLock::new(),
            config: self.config,
        })
    }

    fn validate(&self) -> Result<(), IndexerError> {
        if self.config.get_logs_concurrency == 0 {
            return Err(IndexerError::InvalidGetLogsConcurrency);
        }
        if self.config.processed_cache_capacity == 0 {
            return Err(IndexerError::InvalidCacheCapacity);
        }
        Ok(())
    }
}
