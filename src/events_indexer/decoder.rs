use std::collections::HashMap;

use alloy::{
    dyn_abi::{DynSolValue, EventExt},
    json_abi::Event,
    primitives::{Address, B256, TxHash},
    rpc::types::Log,
};
use thiserror::Error;

/// Why a log could not be decoded with its registered event.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Abi(#[from] alloy::dyn_abi::Error),

    #[error("missing decoded value for parameter '{0}'")]
    MissingValue(String),
}

/// Topic0 → event lookup for the events an indexer listens to.
///
/// Built once from the concrete indexer's event list and never mutated afterwards, so it can be
/// shared between tasks without locking.
#[derive(Clone, Debug, Default)]
pub struct EventRegistry {
    events: HashMap<B256, Event>,
    topics: Vec<B256>,
}

impl EventRegistry {
    /// Registers `events` by selector. Anonymous events have no topic0 to match on and are
    /// skipped; a selector registered twice keeps its first definition.
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        let mut registry = Self::default();
        for event in events {
            if event.anonymous {
                warn!(event = %event.name, "Anonymous events cannot be matched by topic, skipping");
                continue;
            }
            let topic = event.selector();
            if registry.events.contains_key(&topic) {
                continue;
            }
            registry.topics.push(topic);
            registry.events.insert(topic, event);
        }
        registry
    }

    /// Registered topics, in registration order.
    #[must_use]
    pub fn topics(&self) -> &[B256] {
        &self.topics
    }

    #[must_use]
    pub fn get(&self, topic: &B256) -> Option<&Event> {
        self.events.get(topic)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Decodes `logs`, keeping their order.
    ///
    /// Logs whose topic0 is not registered are dropped silently. Logs that match a registered
    /// topic but cannot be decoded with its definition are logged and dropped; the rest of the
    /// batch is still decoded.
    #[must_use]
    pub fn decode_elements(&self, logs: &[Log]) -> Vec<DecodedEvent> {
        logs.iter()
            .filter_map(|log| {
                let event = log.topics().first().and_then(|topic| self.events.get(topic))?;
                match DecodedEvent::decode(event, log) {
                    Ok(decoded) => Some(decoded),
                    Err(err) => {
                        error!(log = ?log, error = %err, "Unexpected log format for log receipt");
                        None
                    }
                }
            })
            .collect()
    }
}

/// One decoded argument of an event.
#[derive(Clone, Debug, PartialEq)]
pub struct EventArg {
    pub name: String,
    pub value: DynSolValue,
    pub indexed: bool,
}

/// A log decoded with its event definition.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedEvent {
    pub name: String,
    /// Arguments in declaration order.
    pub args: Vec<EventArg>,
    /// The raw log the event was decoded from.
    pub log: Log,
}

impl DecodedEvent {
    fn decode(event: &Event, log: &Log) -> Result<Self, DecodeError> {
        let decoded = event.decode_log(&log.inner.data)?;
        let mut indexed = decoded.indexed.into_iter();
        let mut body = decoded.body.into_iter();

        let args = event
            .inputs
            .iter()
            .map(|param| {
                let value = if param.indexed { indexed.next() } else { body.next() };
                let value = value.ok_or_else(|| DecodeError::MissingValue(param.name.clone()))?;
                Ok(EventArg { name: param.name.clone(), value, indexed: param.indexed })
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;

        Ok(Self { name: event.name.clone(), args, log: log.clone() })
    }

    /// Value of the argument called `name`.
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&DynSolValue> {
        self.args.iter().find(|arg| arg.name == name).map(|arg| &arg.value)
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.log.address()
    }

    #[must_use]
    pub fn transaction_hash(&self) -> Option<TxHash> {
        self.log.transaction_hash
    }

    #[must_use]
    pub fn block_number(&self) -> Option<u64> {
        self.log.block_number
    }
}
