use std::pin::pin;

use alloy::{
    network::Network,
    rpc::types::{Filter, Log},
};
use futures::{StreamExt, TryStreamExt, stream};

use crate::{
    block_limit::{BlockRangeController, auto_adjust_block_limit},
    error::{IndexerError, QueryFailure},
    events_indexer::query::LogQuery,
    robust_provider::{Error as RobustProviderError, RobustProvider},
};

/// Source of `eth_getLogs` results.
pub trait LogSource: Send + Sync {
    /// Logs matching `filter`, in the order the node returned them.
    ///
    /// # Errors
    ///
    /// A JSON-RPC error response from the node must be returned as
    /// [`RobustProviderError::RpcError`] wrapping [`alloy::transports::RpcError::ErrorResp`], so
    /// range rejections can be told apart from transport failures.
    fn get_logs(
        &self,
        filter: &Filter,
    ) -> impl Future<Output = Result<Vec<Log>, RobustProviderError>> + Send;
}

impl<N: Network> LogSource for RobustProvider<N> {
    fn get_logs(
        &self,
        filter: &Filter,
    ) -> impl Future<Output = Result<Vec<Log>, RobustProviderError>> + Send {
        RobustProvider::get_logs(self, filter)
    }
}

/// Runs `queries` with at most `concurrency` of them in flight and concatenates their logs in
/// query order.
///
/// The first query is awaited under `controller` so it can size the next range from its outcome
/// alone. The remaining queries are dropped as soon as one of them fails.
pub(crate) async fn fetch_logs<S, C>(
    source: &S,
    controller: &C,
    queries: &[LogQuery],
    from_block: u64,
    to_block: u64,
    concurrency: usize,
) -> Result<Vec<Log>, IndexerError>
where
    S: LogSource + ?Sized,
    C: BlockRangeController + ?Sized,
{
    if queries.is_empty() {
        return Ok(Vec::new());
    }

    let filters: Vec<Filter> = queries.iter().map(Filter::from).collect();
    for filter in &filters {
        debug!(filter = ?filter, "Querying node for logs");
    }

    let mut pending = pin!(
        stream::iter(&filters).map(|filter| source.get_logs(filter)).buffered(concurrency.max(1))
    );

    let mut logs = auto_adjust_block_limit(controller, from_block, to_block, async {
        pending.try_next().await.map(Option::unwrap_or_default)
    })
    .await
    .map_err(|err| retrieval_error(err, from_block, to_block))?;

    while let Some(batch) =
        pending.try_next().await.map_err(|err| retrieval_error(err, from_block, to_block))?
    {
        logs.extend(batch);
    }

    Ok(logs)
}

fn retrieval_error(err: RobustProviderError, from_block: u64, to_block: u64) -> IndexerError {
    match QueryFailure::classify(&err) {
        QueryFailure::Transport => {
            IndexerError::RelevantElementsRetrieval { from_block, to_block, source: err }
        }
        QueryFailure::RangeRejected => {
            warn!(
                from_block = from_block,
                to_block = to_block,
                error = %err,
                "Value error retrieving events"
            );
            IndexerError::RelevantElementsRetrieval { from_block, to_block, source: err }
        }
        QueryFailure::Unclassified => match err {
            RobustProviderError::RpcError(err) => IndexerError::Rpc(err),
            err @ RobustProviderError::Timeout => IndexerError::Provider(err),
        },
    }
}
