//! Block range size control.
//!
//! The scheduler driving an indexer decides how many blocks to request per call. The fetcher
//! reports how the first query of every call went to a [`BlockRangeController`], which is
//! expected to shrink the range when the node struggles and grow it when it keeps up.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use alloy::rpc::types::Log;

use crate::{error::QueryFailure, robust_provider::Error as RobustProviderError};

/// Default initial number of blocks processed per call.
pub const DEFAULT_BLOCK_PROCESS_LIMIT: u64 = 50;

/// Default upper bound for the block limit. `0` means unbounded.
pub const DEFAULT_BLOCK_PROCESS_LIMIT_MAX: u64 = 0;

const SLOW_QUERY: Duration = Duration::from_secs(30);
const SLUGGISH_QUERY: Duration = Duration::from_secs(10);
const FAST_QUERY: Duration = Duration::from_secs(1);
const QUICK_QUERY: Duration = Duration::from_secs(3);
const LINEAR_STEP: u64 = 20;

/// Observer of log query outcomes, used to size future block ranges.
pub trait BlockRangeController: Send + Sync {
    /// The query for `[from_block, to_block]` completed in `elapsed` and returned `log_count`
    /// logs.
    fn on_range_completed(
        &self,
        from_block: u64,
        to_block: u64,
        elapsed: Duration,
        log_count: usize,
    );

    /// The node refused to serve `[from_block, to_block]`.
    fn on_range_rejected(&self, from_block: u64, to_block: u64);

    /// Number of blocks the scheduler should request next, if this controller tracks one.
    fn block_limit(&self) -> Option<u64> {
        None
    }
}

/// Awaits `query` and reports its outcome to `controller`.
///
/// Transport failures and unclassified errors are not reported: they say nothing about the
/// size of the range.
pub async fn auto_adjust_block_limit<C, F>(
    controller: &C,
    from_block: u64,
    to_block: u64,
    query: F,
) -> Result<Vec<Log>, RobustProviderError>
where
    C: BlockRangeController + ?Sized,
    F: Future<Output = Result<Vec<Log>, RobustProviderError>>,
{
    let start = Instant::now();
    let result = query.await;

    match &result {
        Ok(logs) => {
            controller.on_range_completed(from_block, to_block, start.elapsed(), logs.len());
        }
        Err(err) if QueryFailure::classify(err) == QueryFailure::RangeRejected => {
            controller.on_range_rejected(from_block, to_block);
        }
        Err(_) => {}
    }

    result
}

/// Block limit that adapts to how long the node takes to answer.
///
/// | first query took | new limit |
/// |---|---|
/// | more than 30s | halved |
/// | more than 10s | 20 blocks less |
/// | less than 1s | doubled |
/// | less than 3s | 20 blocks more |
///
/// A rejected range halves the limit. The result is kept within `[1, max]`, where a `max` of `0`
/// leaves it unbounded.
#[derive(Debug)]
pub struct AdaptiveBlockLimit {
    current: AtomicU64,
    max: u64,
}

impl AdaptiveBlockLimit {
    #[must_use]
    pub fn new(initial: u64, max: u64) -> Self {
        let limit = Self { current: AtomicU64::new(0), max };
        limit.current.store(limit.clamp(initial), Ordering::Relaxed);
        limit
    }

    /// Number of blocks the scheduler should request next.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn max(&self) -> u64 {
        self.max
    }

    fn clamp(&self, limit: u64) -> u64 {
        let limit = limit.max(1);
        if self.max == 0 { limit } else { limit.min(self.max) }
    }

    fn update(&self, adjust: impl Fn(u64) -> u64) -> u64 {
        let mut current = self.current();
        loop {
            let next = self.clamp(adjust(current));
            match self.current.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for AdaptiveBlockLimit {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_PROCESS_LIMIT, DEFAULT_BLOCK_PROCESS_LIMIT_MAX)
    }
}

impl BlockRangeController for AdaptiveBlockLimit {
    fn on_range_completed(
        &self,
        from_block: u64,
        to_block: u64,
        elapsed: Duration,
        log_count: usize,
    ) {
        let adjust = |limit: u64| {
            if elapsed > SLOW_QUERY {
                limit / 2
            } else if elapsed > SLUGGISH_QUERY {
                limit.saturating_sub(LINEAR_STEP)
            } else if elapsed < FAST_QUERY {
                limit.saturating_mul(2)
            } else if elapsed < QUICK_QUERY {
                limit.saturating_add(LINEAR_STEP)
            } else {
                limit
            }
        };
        let limit = self.update(adjust);

        debug!(
            from_block = from_block,
            to_block = to_block,
            elapsed_ms = elapsed.as_millis() as u64,
            log_count = log_count,
            block_process_limit = limit,
            "Adjusted block process limit"
        );
    }

    fn on_range_rejected(&self, from_block: u64, to_block: u64) {
        let limit = self.update(|limit| limit / 2);

        warn!(
            from_block = from_block,
            to_block = to_block,
            block_process_limit = limit,
            "Node rejected block range, reducing block process limit"
        );
    }

    fn block_limit(&self) -> Option<u64> {
        Some(self.current())
    }
}
