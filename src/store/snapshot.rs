use crate::codec::CodecError;
use crate::kafka::{KafkaKey, TopicPartition};
use thiserror::Error;

/// Error surfaced by snapshot and key stores.
///
/// The core performs no retries; `Transient` exists so an external retry
/// decorator wrapped around a store can classify failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store failure: {reason}")]
    Backend { reason: String },
    #[error("transient store failure: {reason}")]
    Transient { reason: String },
    #[error("state codec failure: {reason}")]
    Codec { reason: String },
}

impl StoreError {
    /// Builds a permanent backend failure.
    pub fn backend(reason: impl Into<String>) -> Self {
        StoreError::Backend {
            reason: reason.into(),
        }
    }

    /// Builds a failure the backend considers retryable.
    pub fn transient(reason: impl Into<String>) -> Self {
        StoreError::Transient {
            reason: reason.into(),
        }
    }

    /// True when an external retry policy may re-attempt the operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient { .. })
    }
}

impl From<CodecError> for StoreError {
    fn from(err: CodecError) -> Self {
        StoreError::Codec {
            reason: err.to_string(),
        }
    }
}

/// Durable latest-state storage per key.
///
/// Implementations are shared across partitions and must tolerate concurrent
/// access for disjoint keys; the core never issues concurrent calls for the
/// same key. `persist` is an idempotent overwrite and `delete` is idempotent.
pub trait SnapshotStore<S>: Send + Sync {
    fn get(&self, key: &KafkaKey) -> Result<Option<S>, StoreError>;
    fn persist(&self, key: &KafkaKey, state: &S) -> Result<(), StoreError>;
    fn delete(&self, key: &KafkaKey) -> Result<(), StoreError>;
}

/// Enumeration of the keys known to belong to a partition, maintained so
/// eager recovery can materialize prior state before consumption begins.
pub trait KeyStore: Send + Sync {
    fn list(&self, partition: &TopicPartition) -> Result<Vec<KafkaKey>, StoreError>;
    fn add(&self, key: KafkaKey) -> Result<(), StoreError>;
    fn remove(&self, key: &KafkaKey) -> Result<(), StoreError>;
}
