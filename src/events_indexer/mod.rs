//! Event log retrieval and processing.
//!
//! An [`EventsIndexer`] fetches the logs of a set of monitored contracts over a block range,
//! drops the ones it already processed, decodes the rest and hands them to a
//! [`ContractEventHandler`].
//!
//! ```rust,no_run
//! use alloy::{json_abi::Event, network::Ethereum, primitives::{Address, TxHash}};
//! use events_indexer::{
//!     ContractEventHandler, DecodedEvent, EventsIndexerBuilder, IndexerError, TransactionStore,
//!     robust_provider::RobustProviderBuilder,
//! };
//!
//! struct Transfers;
//!
//! impl ContractEventHandler for Transfers {
//!     type Output = TxHash;
//!
//!     fn contract_events(&self) -> Vec<Event> {
//!         let transfer = "event Transfer(address indexed from, address indexed to, uint256)";
//!         Event::parse(transfer).into_iter().collect()
//!     }
//!
//!     async fn process_decoded_element(
//!         &self,
//!         event: DecodedEvent,
//!     ) -> Result<Option<TxHash>, IndexerError> {
//!         Ok(event.transaction_hash())
//!     }
//! }
//!
//! struct Store;
//!
//! impl TransactionStore for Store {
//!     async fn create_or_update_from_hashes(&self, _: &[TxHash]) -> Result<(), IndexerError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn example(tokens: Vec<Address>) -> Result<(), IndexerError> {
//! let provider = RobustProviderBuilder::<Ethereum, _>::new("http://localhost:8545")
//!     .fallback("http://localhost:8546")
//!     .build()
//!     .await?;
//! let indexer = EventsIndexerBuilder::new()
//!     .query_chunk_size(500)
//!     .connect(provider, Transfers, Store)
//!     .await?;
//!
//! let logs = indexer.find_relevant_elements(&tokens, 19_000_000, 19_000_049).await?;
//! for tx_hash in indexer.process_elements(&logs).await? {
//!     println!("transfer in {tx_hash}");
//! }
//! # Ok(()) }
//! ```

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

use alloy::{
    primitives::{Address, TxHash},
    rpc::types::Log,
};

use crate::{IndexerError, block_limit::BlockRangeController};

mod builder;
mod config;
mod decoder;
mod fetcher;
mod handler;
mod processed_cache;
mod query;

pub use builder::EventsIndexerBuilder;
pub use config::{
    DEFAULT_BLOCKS_TO_REINDEX_AGAIN, DEFAULT_GET_LOGS_CONCURRENCY, DEFAULT_QUERY_CHUNK_SIZE,
    DEFAULT_UPDATED_BLOCKS_BEHIND, IndexerConfig,
};
pub use decoder::{DecodeError, DecodedEvent, EventArg, EventRegistry};
pub use fetcher::LogSource;
pub use handler::{ContractEventHandler, TransactionStore};
pub use processed_cache::{DEFAULT_PROCESSED_CACHE_CAPACITY, EventId, ProcessedEventCache};
pub use query::{LogQuery, plan_queries};

/// Retrieves, deduplicates, decodes and processes the events of monitored contracts.
///
/// Built with [`EventsIndexerBuilder`]. Every method takes `&self`, so one indexer can be shared
/// between tasks.
pub struct EventsIndexer<H, S, T> {
    pub(crate) source: S,
    pub(crate) handler: H,
    pub(crate) store: T,
    pub(crate) controller: Arc<dyn BlockRangeController>,
    pub(crate) config: IndexerConfig,
    pub(crate) registry: OnceLock<EventRegistry>,
    pub(crate) processed: Mutex<ProcessedEventCache>,
}

impl<H, S, T> EventsIndexer<H, S, T>
where
    H: ContractEventHandler,
    S: LogSource,
    T: TransactionStore,
{
    #[must_use]
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    #[must_use]
    pub fn store(&self) -> &T {
        &self.store
    }

    /// Number of blocks the scheduler should request next, when the block range controller
    /// tracks one.
    #[must_use]
    pub fn block_process_limit(&self) -> Option<u64> {
        self.controller.block_limit()
    }

    /// Events of the handler by topic, built on first use.
    pub fn registry(&self) -> &EventRegistry {
        self.registry.get_or_init(|| {
            let registry = EventRegistry::new(self.handler.contract_events());
            debug!(events = registry.len(), "Built event registry");
            registry
        })
    }

    /// Whether log queries skip the address filter, either by configuration or because the
    /// handler asks for it.
    #[must_use]
    pub fn ignore_addresses_on_log_filter(&self) -> bool {
        self.config.ignore_addresses_on_log_filter || self.handler.ignore_addresses_on_log_filter()
    }

    /// Marks `log` as processed. Returns `false` if it already was.
    pub fn mark_as_processed(&self, log: &Log) -> bool {
        self.processed.lock().unwrap_or_else(PoisonError::into_inner).mark_processed(log)
    }

    /// Decodes `logs` with the handler's events. See [`EventRegistry::decode_elements`].
    pub fn decode_elements(&self, logs: &[Log]) -> Vec<DecodedEvent> {
        self.registry().decode_elements(logs)
    }

    /// Logs emitted by `addresses` between `from_block` and `to_block` (inclusive) matching the
    /// handler's events, in query order.
    ///
    /// Nothing is deduplicated or marked as processed.
    ///
    /// # Errors
    ///
    /// * [`IndexerError::RelevantElementsRetrieval`] if the node could not be reached or refused
    ///   the range. Retry, usually with a smaller range.
    /// * [`IndexerError::Rpc`] for any other RPC failure.
    pub async fn find_relevant_elements(
        &self,
        addresses: &[Address],
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>, IndexerError> {
        let ignore_addresses = self.ignore_addresses_on_log_filter();
        debug!(
            from_block = from_block,
            to_block = to_block,
            addresses = addresses.len(),
            ignore_addresses = ignore_addresses,
            "Filtering for events"
        );

        let queries = query::plan_queries(
            from_block,
            to_block,
            self.registry().topics(),
            addresses,
            self.config.query_chunk_size,
            ignore_addresses,
        );

        let logs = fetcher::fetch_logs(
            &self.source,
            self.controller.as_ref(),
            &queries,
            from_block,
            to_block,
            self.config.get_logs_concurrency,
        )
        .await?;

        if logs.is_empty() {
            debug!(from_block = from_block, to_block = to_block, "No events found");
        } else {
            info!(
                events = logs.len(),
                from_block = from_block,
                to_block = to_block,
                addresses = addresses.len(),
                "Found events"
            );
        }

        Ok(logs)
    }

    /// Processes `logs` and returns what the handler produced, in log order.
    ///
    /// Logs already processed are skipped. The transactions of the remaining logs are stored
    /// before the first event reaches the handler.
    ///
    /// # Errors
    ///
    /// Returns the first error of the transaction store or the handler. Logs of the batch stay
    /// marked as processed.
    pub async fn process_elements(&self, logs: &[Log]) -> Result<Vec<H::Output>, IndexerError> {
        if logs.is_empty() {
            return Ok(Vec::new());
        }

        let not_processed: Vec<Log> =
            logs.iter().filter(|log| self.mark_as_processed(log)).cloned().collect();
        let decoded = self.decode_elements(&not_processed);

        let tx_hashes = distinct_transaction_hashes(&not_processed);
        debug!(transactions = tx_hashes.len(), "Prefetching and storing transactions");
        self.store.create_or_update_from_hashes(&tx_hashes).await?;
        debug!("End prefetching and storing of transactions");

        let total = decoded.len();
        debug!(events = total, "Processing decoded events");
        let mut processed = Vec::with_capacity(total);
        for event in decoded {
            if let Some(output) = self.handler.process_decoded_element(event).await? {
                processed.push(output);
            }
        }
        debug!(events = total, produced = processed.len(), "End processing decoded events");

        Ok(processed)
    }
}

/// Transaction hashes of `logs` without repetition, in order of first occurrence.
fn distinct_transaction_hashes(logs: &[Log]) -> Vec<TxHash> {
    let mut seen = HashSet::with_capacity(logs.len());
    let mut hashes = Vec::with_capacity(logs.len());
    for hash in logs.iter().filter_map(|log| log.transaction_hash) {
        if seen.insert(hash) {
            hashes.push(hash);
        }
    }
    hashes
}
