use std::{fmt::Debug, sync::Arc, time::Duration};

use alloy::{
    network::{Ethereum, Network},
    providers::{Provider, RootProvider},
    rpc::types::{Filter, Log},
    transports::{RpcError, TransportErrorKind},
};
use backon::{ExponentialBuilder, Retryable};
use thiserror::Error;
use tokio::time::{error::Elapsed, timeout};

/// Errors returned by [`RobustProvider`] calls.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The call did not complete within the configured call timeout.
    #[error("Operation timed out")]
    Timeout,

    /// The last provider attempted returned an RPC error.
    #[error("RPC error: {0}")]
    RpcError(Arc<RpcError<TransportErrorKind>>),
}

impl From<RpcError<TransportErrorKind>> for Error {
    fn from(err: RpcError<TransportErrorKind>) -> Self {
        Error::RpcError(Arc::new(err))
    }
}

impl From<Elapsed> for Error {
    fn from(_: Elapsed) -> Self {
        Error::Timeout
    }
}

/// Provider wrapper with a total per-call timeout, backoff retries and failover.
///
/// Only transport-level failures are retried. A JSON-RPC error response (for instance a node
/// refusing an `eth_getLogs` range that is too wide) is deterministic for a given request and is
/// handed back to the caller at once.
#[derive(Clone, Debug)]
pub struct RobustProvider<N: Network = Ethereum> {
    pub(crate) primary_provider: RootProvider<N>,
    pub(crate) fallback_providers: Vec<RootProvider<N>>,
    pub(crate) call_timeout: Duration,
    pub(crate) max_retries: usize,
    pub(crate) min_delay: Duration,
}

impl<N: Network> RobustProvider<N> {
    /// Get a reference to the primary provider
    #[must_use]
    pub fn primary(&self) -> &RootProvider<N> {
        &self.primary_provider
    }

    /// Number of configured fallback providers.
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.fallback_providers.len()
    }

    /// Fetch logs for the given [`Filter`] with retry and timeout.
    ///
    /// # Errors
    ///
    /// See [`try_operation_with_failover`](Self::try_operation_with_failover).
    pub async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, Error> {
        trace!("eth_getLogs called");
        let result = self
            .try_operation_with_failover(move |provider| async move {
                provider.get_logs(filter).await
            })
            .await;
        if let Err(e) = &result {
            error!(error = %e, "eth_getLogs failed");
        }
        result
    }

    /// Execute `operation` against the primary provider, then against each fallback in the
    /// order they were added until one succeeds.
    ///
    /// # Errors
    ///
    /// * [`Error::Timeout`] if the last provider tried exceeded `call_timeout`.
    /// * [`Error::RpcError`] with the last provider's error otherwise.
    pub(crate) async fn try_operation_with_failover<T: Debug, F, Fut>(
        &self,
        operation: F,
    ) -> Result<T, Error>
    where
        F: Fn(RootProvider<N>) -> Fut,
        Fut: Future<Output = Result<T, RpcError<TransportErrorKind>>>,
    {
        let mut last_error = match self.try_provider_with_timeout(self.primary(), &operation).await
        {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        // error responses come from the node itself, another endpoint would only repeat them
        if is_error_response(&last_error) {
            return Err(last_error);
        }

        let num_fallbacks = self.fallback_providers.len();
        if num_fallbacks > 0 {
            info!("Primary provider failed, trying fallback provider(s)");
        }

        for (fallback_idx, provider) in self.fallback_providers.iter().enumerate() {
            info!("Attempting fallback provider {}/{}", fallback_idx + 1, num_fallbacks);

            match self.try_provider_with_timeout(provider, &operation).await {
                Ok(value) => {
                    info!(provider_num = fallback_idx + 1, "Fallback provider succeeded");
                    return Ok(value);
                }
                Err(e) => {
                    error!(provider_num = fallback_idx + 1, err = %e, "Fallback provider failed");
                    let rejected = is_error_response(&e);
                    last_error = e;
                    if rejected {
                        break;
                    }
                }
            }
        }

        Err(last_error)
    }

    /// Run `operation` on a single provider, retrying transport errors with exponential backoff,
    /// all within `call_timeout`.
    async fn try_provider_with_timeout<T, F, Fut>(
        &self,
        provider: &RootProvider<N>,
        operation: F,
    ) -> Result<T, Error>
    where
        F: Fn(RootProvider<N>) -> Fut,
        Fut: Future<Output = Result<T, RpcError<TransportErrorKind>>>,
    {
        let retry_strategy = ExponentialBuilder::default()
            .with_max_times(self.max_retries)
            .with_min_delay(self.min_delay);

        timeout(
            self.call_timeout,
            (|| operation(provider.clone()))
                .retry(retry_strategy)
                .when(|err: &RpcError<TransportErrorKind>| !err.is_error_resp())
                .notify(|err: &RpcError<TransportErrorKind>, dur: Duration| {
                    debug!(error = %err, "RPC error, retrying after {:?}", dur);
                })
                .sleep(tokio::time::sleep),
        )
        .await?
        .map_err(Error::from)
    }
}

fn is_error_response(err: &Error) -> bool {
    matches!(err, Error::RpcError(e) if e.is_error_resp())
}
