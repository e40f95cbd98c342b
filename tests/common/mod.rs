#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use alloy::{
    dyn_abi::DynSolValue,
    json_abi::Event,
    primitives::{Address, B256, Bytes, LogData, TxHash, U256, address},
    rpc::types::{Filter, Log},
    transports::{RpcError, TransportErrorKind},
};
use alloy_json_rpc::ErrorPayload;
use events_indexer::{
    ContractEventHandler, DecodedEvent, EventsIndexer, EventsIndexerBuilder, IndexerError,
    LogSource, TransactionStore, robust_provider::Error as RobustProviderError,
};

pub const TRANSFER: &str =
    "event Transfer(address indexed from, address indexed to, uint256 value)";
pub const APPROVAL: &str =
    "event Approval(address indexed owner, address indexed spender, uint256 value)";

pub const HOLDER: Address = address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
pub const SPENDER: Address = address!("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

pub type TestIndexer = EventsIndexer<TokenHandler, FakeNode, JournaledStore>;

pub fn event(signature: &str) -> Event {
    Event::parse(signature).unwrap()
}

pub fn token(byte: u8) -> Address {
    Address::with_last_byte(byte)
}

pub fn tx(byte: u8) -> TxHash {
    TxHash::repeat_byte(byte)
}

/// A log of `token`, identified by `(block, tx, log_index)` bytes.
#[derive(Clone, Debug)]
pub struct TestLog {
    token: Address,
    topics: Vec<B256>,
    data: Bytes,
    block_number: u64,
    block_hash: u8,
    tx: u8,
    log_index: u64,
}

impl TestLog {
    pub fn transfer(token: Address, value: u64) -> Self {
        Self {
            token,
            topics: vec![event(TRANSFER).selector(), HOLDER.into_word(), SPENDER.into_word()],
            data: Bytes::copy_from_slice(&U256::from(value).to_be_bytes::<32>()),
            block_number: 100,
            block_hash: 1,
            tx: 1,
            log_index: 0,
        }
    }

    pub fn approval(token: Address, value: u64) -> Self {
        Self {
            topics: vec![event(APPROVAL).selector(), HOLDER.into_word(), SPENDER.into_word()],
            ..Self::transfer(token, value)
        }
    }

    /// A `Transfer` log missing its `to` topic.
    pub fn malformed_transfer(token: Address) -> Self {
        let mut log = Self::transfer(token, 0);
        log.topics.truncate(2);
        log
    }

    /// A log whose topic0 is not a registered event.
    pub fn unknown(token: Address) -> Self {
        Self { topics: vec![B256::repeat_byte(0x42)], ..Self::transfer(token, 0) }
    }

    pub fn at(mut self, block_number: u64, block_hash: u8) -> Self {
        self.block_number = block_number;
        self.block_hash = block_hash;
        self
    }

    pub fn tx(mut self, tx: u8, log_index: u64) -> Self {
        self.tx = tx;
        self.log_index = log_index;
        self
    }

    pub fn build(self) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: self.token,
                data: LogData::new_unchecked(self.topics, self.data),
            },
            block_hash: Some(B256::repeat_byte(self.block_hash)),
            block_number: Some(self.block_number),
            block_timestamp: None,
            transaction_hash: Some(tx(self.tx)),
            transaction_index: Some(0),
            log_index: Some(self.log_index),
            removed: false,
        }
    }
}

/// In-memory node answering `eth_getLogs` from a fixed set of logs.
#[derive(Default)]
pub struct FakeNode {
    logs: Vec<Log>,
    failure: Option<fn() -> RobustProviderError>,
    filters: Mutex<Vec<Filter>>,
}

impl FakeNode {
    pub fn new(logs: impl IntoIterator<Item = TestLog>) -> Self {
        Self { logs: logs.into_iter().map(TestLog::build).collect(), ..Self::default() }
    }

    /// A node failing every query with `failure`.
    pub fn failing(failure: fn() -> RobustProviderError) -> Self {
        Self { failure: Some(failure), ..Self::default() }
    }

    /// Filters of every query received so far.
    pub fn filters(&self) -> Vec<Filter> {
        self.filters.lock().unwrap().clone()
    }

    fn matches(filter: &Filter, log: &Log) -> bool {
        let in_range = match (filter.get_from_block(), filter.get_to_block(), log.block_number) {
            (Some(from), Some(to), Some(number)) => (from..=to).contains(&number),
            _ => true,
        };
        let topic_matches =
            log.topics().first().is_some_and(|topic0| filter.topics[0].matches(topic0));

        in_range && topic_matches && filter.matches_address(log.address())
    }
}

impl LogSource for FakeNode {
    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, RobustProviderError> {
        self.filters.lock().unwrap().push(filter.clone());
        if let Some(failure) = self.failure {
            return Err(failure());
        }
        Ok(self.logs.iter().filter(|log| Self::matches(filter, log)).cloned().collect())
    }
}

pub fn range_too_large() -> RobustProviderError {
    RpcError::<TransportErrorKind>::ErrorResp(ErrorPayload {
        code: -32005,
        message: "eth_getLogs block range too large, range: 138001, max: 100000".into(),
        data: None,
    })
    .into()
}

pub fn connection_reset() -> RobustProviderError {
    RpcError::Transport(TransportErrorKind::BackendGone).into()
}

/// Shared record of store and handler calls, in call order.
pub type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
pub struct JournaledStore {
    journal: Journal,
    calls: Mutex<Vec<Vec<TxHash>>>,
    fail: bool,
}

impl JournaledStore {
    pub fn calls(&self) -> Vec<Vec<TxHash>> {
        self.calls.lock().unwrap().clone()
    }
}

impl TransactionStore for JournaledStore {
    async fn create_or_update_from_hashes(
        &self,
        tx_hashes: &[TxHash],
    ) -> Result<(), IndexerError> {
        self.journal.lock().unwrap().push(format!("store {}", tx_hashes.len()));
        self.calls.lock().unwrap().push(tx_hashes.to_vec());
        if self.fail {
            return Err(IndexerError::TransactionStore("database unavailable".into()));
        }
        Ok(())
    }
}

/// Handler keeping `Transfer` values and acknowledging `Approval`s without output.
#[derive(Default)]
pub struct TokenHandler {
    journal: Journal,
    handled: Mutex<Vec<DecodedEvent>>,
    ignore_addresses: bool,
    fail_on_value: Option<u64>,
}

impl TokenHandler {
    pub fn handled(&self) -> Vec<DecodedEvent> {
        self.handled.lock().unwrap().clone()
    }
}

impl ContractEventHandler for TokenHandler {
    type Output = (Address, U256);

    fn contract_events(&self) -> Vec<Event> {
        vec![event(TRANSFER), event(APPROVAL)]
    }

    async fn process_decoded_element(
        &self,
        event: DecodedEvent,
    ) -> Result<Option<(Address, U256)>, IndexerError> {
        self.journal.lock().unwrap().push(format!("handle {}", event.name));
        self.handled.lock().unwrap().push(event.clone());

        let Some(DynSolValue::Uint(value, _)) = event.arg("value").cloned() else {
            return Err(IndexerError::Handler {
                event: event.name,
                reason: "missing value".into(),
            });
        };
        if self.fail_on_value.is_some_and(|fail| value == U256::from(fail)) {
            return Err(IndexerError::Handler { event: event.name, reason: "rejected".into() });
        }

        Ok((event.name == "Transfer").then(|| (event.address(), value)))
    }

    fn ignore_addresses_on_log_filter(&self) -> bool {
        self.ignore_addresses
    }
}

/// Knobs for [`setup_indexer`].
#[derive(Default)]
pub struct Setup {
    pub builder: EventsIndexerBuilder,
    pub failing_store: bool,
    pub handler_ignores_addresses: bool,
    pub handler_fails_on_value: Option<u64>,
}

pub fn setup_indexer(node: FakeNode, setup: Setup) -> anyhow::Result<(TestIndexer, Journal)> {
    let journal = Journal::default();
    let store = JournaledStore {
        journal: journal.clone(),
        fail: setup.failing_store,
        ..Default::default()
    };
    let handler = TokenHandler {
        journal: journal.clone(),
        ignore_addresses: setup.handler_ignores_addresses,
        fail_on_value: setup.handler_fails_on_value,
        ..Default::default()
    };

    let indexer = setup.builder.build(node, handler, store)?;
    Ok((indexer, journal))
}

pub fn default_indexer(node: FakeNode) -> anyhow::Result<TestIndexer> {
    Ok(setup_indexer(node, Setup::default())?.0)
}
