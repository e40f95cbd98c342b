use alloy::{
    primitives::{Address, B256, Bytes, LogData},
    rpc::types::Log,
};

/// Builds RPC logs for unit tests; hashes are given as a repeated byte.
#[derive(Clone, Debug)]
pub(crate) struct LogBuilder {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
    block_number: u64,
    block_hash: B256,
    tx_hash: B256,
    log_index: u64,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self {
            address: Address::with_last_byte(1),
            topics: Vec::new(),
            data: Bytes::new(),
            block_number: 1,
            block_hash: B256::repeat_byte(1),
            tx_hash: B256::repeat_byte(1),
            log_index: 0,
        }
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    pub fn topics(mut self, topics: Vec<B256>) -> Self {
        self.topics = topics;
        self
    }

    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    pub fn block_hash(mut self, byte: u8) -> Self {
        self.block_hash = B256::repeat_byte(byte);
        self
    }

    pub fn tx_hash(mut self, byte: u8) -> Self {
        self.tx_hash = B256::repeat_byte(byte);
        self
    }

    pub fn log_index(mut self, log_index: u64) -> Self {
        self.log_index = log_index;
        self
    }

    pub fn build(self) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: self.address,
                data: LogData::new_unchecked(self.topics, self.data),
            },
            block_hash: Some(self.block_hash),
            block_number: Some(self.block_number),
            block_timestamp: None,
            transaction_hash: Some(self.tx_hash),
            transaction_index: Some(0),
            log_index: Some(self.log_index),
            removed: false,
        }
    }
}
