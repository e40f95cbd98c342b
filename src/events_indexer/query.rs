use alloy::{
    primitives::{Address, B256},
    rpc::types::Filter,
};

/// A single `eth_getLogs` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogQuery {
    pub from_block: u64,
    pub to_block: u64,
    /// Matched as one OR-group on topic0.
    pub topics: Vec<B256>,
    /// `None` queries every contract emitting one of `topics`.
    pub addresses: Option<Vec<Address>>,
}

impl From<&LogQuery> for Filter {
    fn from(query: &LogQuery) -> Self {
        let filter = Filter::new()
            .from_block(query.from_block)
            .to_block(query.to_block)
            .event_signature(query.topics.clone());

        match &query.addresses {
            Some(addresses) => filter.address(addresses.clone()),
            None => filter,
        }
    }
}

/// Builds the queries for one logical `[from_block, to_block]` request.
///
/// With `ignore_addresses` every registered topic is queried for all contracts in a single
/// query; callers then receive logs for addresses they do not monitor. Otherwise `addresses` is
/// split into chunks of at most `chunk_size` (`0` keeps them in one query) and an empty address
/// list produces no query at all.
///
/// No topics means no query either: an empty topic0 set would match every log.
#[must_use]
pub fn plan_queries(
    from_block: u64,
    to_block: u64,
    topics: &[B256],
    addresses: &[Address],
    chunk_size: usize,
    ignore_addresses: bool,
) -> Vec<LogQuery> {
    let query = |addresses: Option<Vec<Address>>| LogQuery {
        from_block,
        to_block,
        topics: topics.to_vec(),
        addresses,
    };

    if topics.is_empty() {
        return Vec::new();
    }

    if ignore_addresses {
        return vec![query(None)];
    }

    if addresses.is_empty() {
        return Vec::new();
    }

    let chunk_size = if chunk_size == 0 { addresses.len() } else { chunk_size };
    addresses.chunks(chunk_size).map(|chunk| query(Some(chunk.to_vec()))).collect()
}
