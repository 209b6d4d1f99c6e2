use crate::kafka::{KafkaKey, TopicPartition};
use crate::store::snapshot::{KeyStore, SnapshotStore, StoreError};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory snapshot store. Cloned handles share the same underlying map,
/// so a "restarted" flow in tests sees the state its predecessor persisted.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore<S> {
    entries: Arc<Mutex<HashMap<KafkaKey, S>>>,
}

impl<S> Clone for MemorySnapshotStore<S> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<S> MemorySnapshotStore<S> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// True when no snapshots are stored.
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl<S: Clone> MemorySnapshotStore<S> {
    /// Returns the stored snapshot for a key, if present.
    pub fn snapshot(&self, key: &KafkaKey) -> Option<S> {
        lock(&self.entries).get(key).cloned()
    }
}

impl<S: Clone + Send> SnapshotStore<S> for MemorySnapshotStore<S> {
    fn get(&self, key: &KafkaKey) -> Result<Option<S>, StoreError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn persist(&self, key: &KafkaKey, state: &S) -> Result<(), StoreError> {
        lock(&self.entries).insert(key.clone(), state.clone());
        Ok(())
    }

    fn delete(&self, key: &KafkaKey) -> Result<(), StoreError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// In-memory key enumeration backing eager recovery. Cloned handles share
/// the same key set.
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyStore {
    keys: Arc<Mutex<BTreeSet<KafkaKey>>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self {
            keys: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    /// Number of registered keys across all partitions.
    pub fn len(&self) -> usize {
        lock(&self.keys).len()
    }

    /// True when no keys are registered.
    pub fn is_empty(&self) -> bool {
        lock(&self.keys).is_empty()
    }
}

impl KeyStore for MemoryKeyStore {
    fn list(&self, partition: &TopicPartition) -> Result<Vec<KafkaKey>, StoreError> {
        Ok(lock(&self.keys)
            .iter()
            .filter(|key| key.topic_partition() == partition)
            .cloned()
            .collect())
    }

    fn add(&self, key: KafkaKey) -> Result<(), StoreError> {
        lock(&self.keys).insert(key);
        Ok(())
    }

    fn remove(&self, key: &KafkaKey) -> Result<(), StoreError> {
        lock(&self.keys).remove(key);
        Ok(())
    }
}
