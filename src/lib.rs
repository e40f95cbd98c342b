//! Events-Indexer retrieves, deduplicates and decodes EVM event logs for a set of monitored
//! contracts.
//!
//! The main entry point is [`EventsIndexer`], built via [`EventsIndexerBuilder`] around a
//! [`ContractEventHandler`] (which events to listen to and what to do with them) and a
//! [`TransactionStore`] (where the transactions of those events are persisted).
//!
//! A scheduler, which is not part of this crate, drives the indexer one block range at a time:
//!
//! 1. [`EventsIndexer::find_relevant_elements`] queries the node for the logs of the monitored
//!    addresses, splitting large address sets into several concurrent `eth_getLogs` calls.
//! 2. [`EventsIndexer::process_elements`] drops the logs it already processed, decodes the rest,
//!    stores their transactions and hands every decoded event to the handler.
//!
//! # Reorgs and duplicates
//!
//! Schedulers usually scan the last few blocks again on every run to pick up reorganized events.
//! Processed logs are remembered by block hash, transaction hash and log index in a bounded
//! cache, so re-scanned logs are skipped while a log re-included in a different block is handled
//! again. The cache is bounded: a log evicted from it is processed again if it is seen later, so
//! handlers must be idempotent.
//!
//! # Block range size
//!
//! Nodes limit how many blocks or logs a single `eth_getLogs` call may cover. The duration of the
//! first query of every call, and any range rejected by the node, are reported to a
//! [`block_limit::BlockRangeController`]. The default [`block_limit::AdaptiveBlockLimit`] grows
//! the range while the node answers quickly and shrinks it when it does not.
//!
//! # Robust providers
//!
//! The [`robust_provider`] module provides [`robust_provider::RobustProvider`], a wrapper that
//! retries transport failures and fails over across multiple RPC endpoints.
//!
//! # Logging
//!
//! With the default `tracing` feature, the crate emits `tracing` events under the
//! `events_indexer` target. Installing a subscriber is left to the application.

#[macro_use]
mod logging;

pub mod block_limit;
pub mod events_indexer;
pub mod robust_provider;

mod error;
#[cfg(test)]
mod test_utils;

pub use block_limit::{AdaptiveBlockLimit, BlockRangeController};
pub use error::{IndexerError, QueryFailure};
pub use events_indexer::{
    ContractEventHandler, DecodedEvent, EventArg, EventsIndexer, EventsIndexerBuilder,
    IndexerConfig, LogSource, TransactionStore,
};
