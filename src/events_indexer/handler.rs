use alloy::{json_abi::Event, primitives::TxHash};

use crate::{IndexerError, events_indexer::decoder::DecodedEvent};

/// Domain side of an events indexer: which events to listen to and what to do with them.
pub trait ContractEventHandler: Send + Sync {
    /// What processing a decoded event produces, e.g. the database row it created.
    type Output: Send;

    /// Events to retrieve and decode. Called once, the first time the indexer needs them.
    fn contract_events(&self) -> Vec<Event>;

    /// Handles one decoded event.
    ///
    /// Returns `Ok(None)` when the event was acknowledged but produced nothing worth returning.
    ///
    /// # Errors
    ///
    /// Any error aborts the batch. Events already handled in the batch stay marked as processed.
    fn process_decoded_element(
        &self,
        event: DecodedEvent,
    ) -> impl Future<Output = Result<Option<Self::Output>, IndexerError>> + Send;

    /// Query every contract emitting one of the registered events instead of only the monitored
    /// addresses. Useful when the monitored set is too large to filter on.
    fn ignore_addresses_on_log_filter(&self) -> bool {
        false
    }
}

/// Persistence of the transactions events belong to.
pub trait TransactionStore: Send + Sync {
    /// Makes sure every transaction in `tx_hashes` is stored before its events are handled.
    /// Must be idempotent: the same hashes can be sent again after a re-scan.
    ///
    /// # Errors
    ///
    /// Aborts the batch before any event is handled.
    fn create_or_update_from_hashes(
        &self,
        tx_hashes: &[TxHash],
    ) -> impl Future<Output = Result<(), IndexerError>> + Send;
}

impl<T: TransactionStore + ?Sized> TransactionStore for std::sync::Arc<T> {
    fn create_or_update_from_hashes(
        &self,
        tx_hashes: &[TxHash],
    ) -> impl Future<Output = Result<(), IndexerError>> + Send {
        (**self).create_or_update_from_hashes(tx_hashes)
    }
}
