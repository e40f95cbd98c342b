use std::collections::{HashSet, VecDeque};

use alloy::{primitives::B256, rpc::types::Log};

/// Default number of event identities remembered by the dedup cache (around 3 MiB).
pub const DEFAULT_PROCESSED_CACHE_CAPACITY: usize = 40_000;

/// Identity of a log: block hash, transaction hash and log index.
///
/// The block hash is part of the key so a log re-included by a reorg with the same transaction
/// hash and log index, but in a different block, is a distinct event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventId([u8; 72]);

impl EventId {
    #[must_use]
    pub fn new(block_hash: B256, tx_hash: B256, log_index: u64) -> Self {
        let mut id = [0u8; 72];
        id[..32].copy_from_slice(block_hash.as_slice());
        id[32..64].copy_from_slice(tx_hash.as_slice());
        id[64..].copy_from_slice(&log_index.to_be_bytes());
        Self(id)
    }

    /// Identity of `log`; fields the node left empty count as zero.
    #[must_use]
    pub fn from_log(log: &Log) -> Self {
        Self::new(
            log.block_hash.unwrap_or_default(),
            log.transaction_hash.unwrap_or_default(),
            log.log_index.unwrap_or_default(),
        )
    }
}

/// Bounded set of already processed events.
///
/// Eviction is strictly first-in first-out: once full, inserting evicts the oldest inserted
/// identity. Lookups never refresh an entry.
#[derive(Clone, Debug)]
pub struct ProcessedEventCache {
    order: VecDeque<EventId>,
    seen: HashSet<EventId>,
    capacity: usize,
}

impl ProcessedEventCache {
    /// Creates an empty cache holding at most `capacity` identities.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Marks `log` as processed.
    ///
    /// Returns `true` if it was not seen before, `false` if it was already processed, in which
    /// case the cache is left untouched.
    pub fn mark_processed(&mut self, log: &Log) -> bool {
        let id = EventId::from_log(log);
        if self.seen.contains(&id) {
            debug!(
                tx_hash = ?log.transaction_hash,
                log_index = ?log.log_index,
                block_hash = ?log.block_hash,
                "Event was already processed"
            );
            return false;
        }

        debug!(
            tx_hash = ?log.transaction_hash,
            log_index = ?log.log_index,
            block_hash = ?log.block_hash,
            "Marking event as processed"
        );
        self.insert(id);
        true
    }

    #[must_use]
    pub fn contains(&self, id: &EventId) -> bool {
        self.seen.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn insert(&mut self, id: EventId) {
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(id);
        self.seen.insert(id);
    }
}

impl Default for ProcessedEventCache {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESSED_CACHE_CAPACITY)
    }
}
