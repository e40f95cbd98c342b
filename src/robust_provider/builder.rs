use std::{pin::Pin, time::Duration};

use alloy::{network::Network, providers::RootProvider};
use futures::future::{try_join, try_join_all};

use crate::robust_provider::{IntoRootProvider, RobustProvider, provider::Error};

type BoxedProviderFuture<N> = Pin<Box<dyn Future<Output = Result<RootProvider<N>, Error>> + Send>>;

/// Default bound for one log query against one endpoint, retries included.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);
/// Default maximum number of retry attempts per provider.
pub const DEFAULT_MAX_RETRIES: usize = 3;
/// Default base delay of the exponential backoff.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);

/// Configures the node endpoints `eth_getLogs` requests go to.
///
/// Every log query runs against the primary endpoint first. A query that times out or hits a
/// transport error is retried with exponential backoff, then moves on to the fallbacks in the
/// order they were added. Error responses from a node go straight back to the indexer.
pub struct RobustProviderBuilder<N: Network, P: IntoRootProvider<N>> {
    primary_provider: P,
    fallback_providers: Vec<BoxedProviderFuture<N>>,
    call_timeout: Duration,
    max_retries: usize,
    min_delay: Duration,
}

impl<N: Network, P: IntoRootProvider<N>> RobustProviderBuilder<N, P> {
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self {
            primary_provider: provider,
            fallback_providers: vec![],
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            min_delay: DEFAULT_MIN_DELAY,
        }
    }

    /// A single attempt per endpoint, bounded by the call timeout.
    ///
    /// Suits callers that already retry failed block ranges themselves.
    #[must_use]
    pub fn fragile(provider: P) -> Self {
        Self::new(provider).max_retries(0).min_delay(Duration::ZERO)
    }

    /// Appends a backup endpoint.
    #[must_use]
    pub fn fallback<F: IntoRootProvider<N> + Send + 'static>(mut self, provider: F) -> Self {
        self.fallback_providers.push(Box::pin(provider.into_root_provider()));
        self
    }

    /// Appends several backup endpoints, keeping their order.
    #[must_use]
    pub fn fallbacks<F, I>(self, providers: I) -> Self
    where
        F: IntoRootProvider<N> + Send + 'static,
        I: IntoIterator<Item = F>,
    {
        providers.into_iter().fold(self, Self::fallback)
    }

    /// Upper bound for one log query against one endpoint, backoff included.
    #[must_use]
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    /// Connects all endpoints concurrently.
    ///
    /// # Errors
    ///
    /// Fails with the first endpoint that cannot be connected.
    pub async fn build(self) -> Result<RobustProvider<N>, Error> {
        debug!(
            call_timeout_ms = self.call_timeout.as_millis(),
            max_retries = self.max_retries,
            fallback_count = self.fallback_providers.len(),
            "Connecting log query endpoints"
        );

        let (primary_provider, fallback_providers) = try_join(
            self.primary_provider.into_root_provider(),
            try_join_all(self.fallback_providers),
        )
        .await?;

        Ok(RobustProvider {
            primary_provider,
            fallback_providers,
            call_timeout: self.call_timeout,
            max_retries: self.max_retries,
            min_delay: self.min_delay,
        })
    }
}
