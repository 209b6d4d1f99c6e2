use crate::codec::StateCodec;
use crate::kafka::{FlowScope, KafkaKey, TopicPartition};
use crate::store::snapshot::{KeyStore, SnapshotStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Producer `acks` setting required for the compacted state topic.
pub const CHANGELOG_PRODUCER_ACKS: &str = "all";
/// Producer idempotence setting required for the compacted state topic.
pub const CHANGELOG_PRODUCER_IDEMPOTENCE: bool = true;
/// Recovery consumer `auto.offset.reset` setting.
pub const CHANGELOG_CONSUMER_AUTO_OFFSET_RESET: &str = "earliest";
/// Recovery consumer `enable.auto.commit` setting.
pub const CHANGELOG_CONSUMER_AUTO_COMMIT: bool = false;

/// Record read back from the state changelog. A `None` value is a tombstone
/// and removes the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogRecord {
    pub key: Vec<u8>,
    pub value: Option<Vec<u8>>,
    pub offset: u64,
}

/// Write side of the state changelog. The embedding application implements
/// this against its producer client, configured per the
/// `CHANGELOG_PRODUCER_*` constants; the changelog topic is compacted and
/// its partition count matches the input topic.
pub trait ChangelogProducer: Send + Sync {
    fn send(
        &self,
        partition: &TopicPartition,
        key: &[u8],
        value: Option<&[u8]>,
    ) -> Result<(), StoreError>;
}

/// Read side used only during bootstrap: everything from earliest up to the
/// end offset observed at call time. The reader is borrowed for the duration
/// of the bootstrap and discarded afterwards.
pub trait ChangelogReader {
    fn read_to_current_end(
        &self,
        partition: &TopicPartition,
    ) -> Result<Vec<ChangelogRecord>, StoreError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory changelog modeling a compacted topic: an appended log per
/// partition, compaction applied at read time by folding per key.
#[derive(Debug, Default)]
pub struct MemoryChangelog {
    partitions: Mutex<HashMap<TopicPartition, Vec<ChangelogRecord>>>,
}

impl MemoryChangelog {
    pub fn new() -> Self {
        Self {
            partitions: Mutex::new(HashMap::new()),
        }
    }

    /// Number of appended records for a partition, tombstones included.
    pub fn record_count(&self, partition: &TopicPartition) -> usize {
        lock(&self.partitions)
            .get(partition)
            .map_or(0, Vec::len)
    }
}

impl ChangelogProducer for MemoryChangelog {
    fn send(
        &self,
        partition: &TopicPartition,
        key: &[u8],
        value: Option<&[u8]>,
    ) -> Result<(), StoreError> {
        let mut partitions = lock(&self.partitions);
        let records = partitions.entry(partition.clone()).or_default();
        let offset = records.len() as u64;
        records.push(ChangelogRecord {
            key: key.to_vec(),
            value: value.map(<[u8]>::to_vec),
            offset,
        });
        Ok(())
    }
}

impl ChangelogReader for MemoryChangelog {
    fn read_to_current_end(
        &self,
        partition: &TopicPartition,
    ) -> Result<Vec<ChangelogRecord>, StoreError> {
        Ok(lock(&self.partitions)
            .get(partition)
            .cloned()
            .unwrap_or_default())
    }
}

/// Snapshot store backed by a compacted changelog topic.
///
/// Bootstrap folds the changelog by key (later offsets win, tombstones
/// remove) into a byte cache; afterwards `get` decodes from the cache and
/// `persist`/`delete` write through it to the producer. Key enumeration
/// derives from the cache, so the store doubles as the partition `KeyStore`.
pub struct ChangelogSnapshotStore<C> {
    scope: FlowScope,
    codec: C,
    producer: Arc<dyn ChangelogProducer>,
    cache: Mutex<HashMap<KafkaKey, Vec<u8>>>,
}

impl<C> ChangelogSnapshotStore<C> {
    /// Reads the listed partitions to their current end and builds the store.
    pub fn bootstrap(
        scope: FlowScope,
        codec: C,
        producer: Arc<dyn ChangelogProducer>,
        reader: &dyn ChangelogReader,
        partitions: &[TopicPartition],
    ) -> Result<Self, StoreError> {
        let mut cache = HashMap::new();
        for partition in partitions {
            for record in reader.read_to_current_end(partition)? {
                let key = scope.key_for(partition, record.key);
                match record.value {
                    Some(bytes) => {
                        cache.insert(key, bytes);
                    }
                    None => {
                        cache.remove(&key);
                    }
                }
            }
        }
        Ok(Self {
            scope,
            codec,
            producer,
            cache: Mutex::new(cache),
        })
    }

    /// Number of live snapshots in the cache.
    pub fn len(&self) -> usize {
        lock(&self.cache).len()
    }

    /// True when the cache holds no snapshots.
    pub fn is_empty(&self) -> bool {
        lock(&self.cache).is_empty()
    }

    /// Scope the cached keys belong to.
    pub fn scope(&self) -> &FlowScope {
        &self.scope
    }
}

impl<S, C> SnapshotStore<S> for ChangelogSnapshotStore<C>
where
    C: StateCodec<S>,
{
    fn get(&self, key: &KafkaKey) -> Result<Option<S>, StoreError> {
        match lock(&self.cache).get(key) {
            Some(bytes) => Ok(Some(self.codec.decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn persist(&self, key: &KafkaKey, state: &S) -> Result<(), StoreError> {
        let bytes = self.codec.encode(state)?;
        self.producer
            .send(key.topic_partition(), key.key(), Some(&bytes))?;
        lock(&self.cache).insert(key.clone(), bytes);
        Ok(())
    }

    fn delete(&self, key: &KafkaKey) -> Result<(), StoreError> {
        self.producer.send(key.topic_partition(), key.key(), None)?;
        lock(&self.cache).remove(key);
        Ok(())
    }
}

impl<C> KeyStore for ChangelogSnapshotStore<C>
where
    C: Send + Sync,
{
    fn list(&self, partition: &TopicPartition) -> Result<Vec<KafkaKey>, StoreError> {
        let mut keys: Vec<KafkaKey> = lock(&self.cache)
            .keys()
            .filter(|key| key.topic_partition() == partition)
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn add(&self, _key: KafkaKey) -> Result<(), StoreError> {
        // Enumeration derives from persisted snapshots; nothing to register.
        Ok(())
    }

    fn remove(&self, _key: &KafkaKey) -> Result<(), StoreError> {
        // Removal happens when the deletion tombstone is persisted.
        Ok(())
    }
}
