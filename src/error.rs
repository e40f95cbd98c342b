use std::sync::Arc;

use alloy::transports::{RpcError, TransportErrorKind};
use thiserror::Error;

use crate::robust_provider::Error as RobustProviderError;

/// Errors returned by the indexer.
///
/// Only [`IndexerError::RelevantElementsRetrieval`] is expected during normal operation: it is
/// raised when the node cannot be reached or refuses the requested range, and the scheduler is
/// expected to retry, usually with a smaller range. Every other variant aborts the current
/// indexing attempt.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Logs for the range could not be retrieved. Retryable.
    #[error("Request error retrieving events from-block={from_block} to-block={to_block}")]
    RelevantElementsRetrieval {
        from_block: u64,
        to_block: u64,
        #[source]
        source: RobustProviderError,
    },

    /// An RPC failure that is neither a transport failure nor a node-side rejection.
    #[error("RPC error: {0}")]
    Rpc(Arc<RpcError<TransportErrorKind>>),

    /// The transaction-persistence collaborator failed.
    #[error("Transaction store error: {0}")]
    TransactionStore(String),

    /// The concrete indexer's event handler failed.
    #[error("Handler error processing '{event}': {reason}")]
    Handler { event: String, reason: String },

    #[error("get_logs concurrency must be greater than 0")]
    InvalidGetLogsConcurrency,

    #[error("Processed events cache capacity must be greater than 0")]
    InvalidCacheCapacity,

    #[error("Provider error: {0}")]
    Provider(#[from] RobustProviderError),
}

impl IndexerError {
    /// Returns `true` if retrying the same (or a smaller) range may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RelevantElementsRetrieval { .. })
    }
}

/// How a failed log query is handled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QueryFailure {
    /// Connection errors, dropped backends, timeouts.
    Transport,
    /// The node answered with a JSON-RPC error, typically a block range or response size limit
    /// (`-32005` on Infura/Polygon, `-32000` on BSC).
    RangeRejected,
    /// Anything else, such as a response that cannot be deserialized.
    Unclassified,
}

impl QueryFailure {
    #[must_use]
    pub fn classify(error: &RobustProviderError) -> Self {
        match error {
            RobustProviderError::Timeout => Self::Transport,
            RobustProviderError::RpcError(err) => match err.as_ref() {
                RpcError::Transport(_) => Self::Transport,
                RpcError::ErrorResp(_) => Self::RangeRejected,
                _ => Self::Unclassified,
            },
        }
    }
}
