use serde::{Deserialize, Serialize};
use std::fmt;

/// Topic + partition pair identifying a single shard of the input log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicPartition {
    topic: String,
    partition: i32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }

    /// Topic name.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Partition index within the topic.
    pub fn partition(&self) -> i32 {
        self.partition
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

/// Application + consumer group scope that namespaces every persisted key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowScope {
    application_id: String,
    group_id: String,
}

impl FlowScope {
    pub fn new(application_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            group_id: group_id.into(),
        }
    }

    /// Application identifier shared by all keys of this deployment.
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// Consumer group identifier.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Builds the full key identity for a record key on a partition.
    pub fn key_for(&self, partition: &TopicPartition, key: impl Into<Vec<u8>>) -> KafkaKey {
        KafkaKey {
            application_id: self.application_id.clone(),
            group_id: self.group_id.clone(),
            topic_partition: partition.clone(),
            key: key.into(),
        }
    }
}

/// Canonical identity of a stateful entity. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KafkaKey {
    application_id: String,
    group_id: String,
    topic_partition: TopicPartition,
    key: Vec<u8>,
}

impl KafkaKey {
    /// Application identifier component.
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// Consumer group component.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Partition the key belongs to.
    pub fn topic_partition(&self) -> &TopicPartition {
        &self.topic_partition
    }

    /// Raw record key bytes.
    pub fn key(&self) -> &[u8] {
        &self.key
    }
}

/// Header attached to an input record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub key: String,
    pub value: Vec<u8>,
}

impl RecordHeader {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Single record consumed from the input log.
///
/// Records without a key cannot take part in keyed processing; the partition
/// flow skips them while still advancing the processed-offset ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerRecord {
    pub topic_partition: TopicPartition,
    pub offset: u64,
    pub key: Option<Vec<u8>>,
    pub value: Vec<u8>,
    pub timestamp_ms: u64,
    pub headers: Vec<RecordHeader>,
}

impl ConsumerRecord {
    /// Creates a keyed record with no timestamp or headers.
    pub fn new(
        topic_partition: TopicPartition,
        offset: u64,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            topic_partition,
            offset,
            key: Some(key.into()),
            value: value.into(),
            timestamp_ms: 0,
            headers: Vec::new(),
        }
    }

    /// Creates a record that carries no key.
    pub fn unkeyed(topic_partition: TopicPartition, offset: u64, value: impl Into<Vec<u8>>) -> Self {
        Self {
            topic_partition,
            offset,
            key: None,
            value: value.into(),
            timestamp_ms: 0,
            headers: Vec::new(),
        }
    }

    /// Attaches the broker timestamp.
    pub fn with_timestamp_ms(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Appends a header.
    pub fn with_header(mut self, header: RecordHeader) -> Self {
        self.headers.push(header);
        self
    }
}
