use keyflow::{
    CommitQueue, CommitRequest, ConsumerRecord, FlowCollaborators, FlowConfig, FlowScope, Fold,
    FoldContext, FoldError, KafkaKey, KeyStore, MemoryKeyStore, MemorySnapshotStore,
    PartitionFlow, RecoveryError, SnapshotStore, StoreError, TopicPartition,
};
use std::sync::Arc;

fn partition() -> TopicPartition {
    TopicPartition::new("events", 3)
}

fn scope() -> FlowScope {
    FlowScope::new("app", "group")
}

struct LastValueFold;

impl Fold<String> for LastValueFold {
    fn apply(
        &self,
        _ctx: &mut FoldContext,
        _state: Option<String>,
        record: &ConsumerRecord,
    ) -> Result<Option<String>, FoldError> {
        let value = String::from_utf8(record.value.clone()).map_err(|err| FoldError::Decode {
            offset: record.offset,
            reason: err.to_string(),
        })?;
        Ok(Some(value))
    }
}

struct BrokenKeyStore;

impl KeyStore for BrokenKeyStore {
    fn list(&self, _partition: &TopicPartition) -> Result<Vec<KafkaKey>, StoreError> {
        Err(StoreError::transient("enumeration unavailable"))
    }

    fn add(&self, _key: KafkaKey) -> Result<(), StoreError> {
        Ok(())
    }

    fn remove(&self, _key: &KafkaKey) -> Result<(), StoreError> {
        Ok(())
    }
}

fn seeded_stores() -> (MemorySnapshotStore<String>, MemoryKeyStore) {
    let store = MemorySnapshotStore::new();
    let key_store = MemoryKeyStore::new();
    for (key, value) in [("key1", "A"), ("key2", "B")] {
        let kafka_key = scope().key_for(&partition(), key);
        store
            .persist(&kafka_key, &value.to_string())
            .expect("seed snapshot");
        key_store.add(kafka_key).expect("seed key");
    }
    (store, key_store)
}

#[test]
fn recovered_keys_do_not_hold_back_the_commit() {
    let (store, key_store) = seeded_stores();
    let queue = Arc::new(CommitQueue::default());
    let collaborators = FlowCollaborators {
        fold: Arc::new(LastValueFold),
        store: Arc::new(store.clone()),
        key_store: Arc::new(key_store),
        committer: queue.clone(),
    };
    let mut flow = PartitionFlow::assign(
        scope(),
        partition(),
        500,
        FlowConfig::low_latency(),
        collaborators,
        0,
    )
    .expect("assignment succeeds");

    assert_eq!(flow.key_count(), 2);
    assert_eq!(flow.telemetry().keys_recovered(), 2);
    assert_eq!(
        flow.key_state(b"key1").and_then(|state| state.state()),
        Some(&"A".to_string())
    );

    flow.apply(&[ConsumerRecord::new(partition(), 501, "key3", "C")], 1)
        .expect("first batch applies");
    assert_eq!(
        queue.drain(),
        vec![CommitRequest {
            partition: partition(),
            offset: 502
        }]
    );
    let key3 = scope().key_for(&partition(), "key3");
    assert_eq!(store.snapshot(&key3), Some("C".to_string()));
}

#[test]
fn the_first_record_for_a_recovered_key_sees_its_snapshot() {
    let (store, key_store) = seeded_stores();
    let queue = Arc::new(CommitQueue::default());
    let observed = Arc::new(std::sync::Mutex::new(Vec::new()));
    let observer = Arc::clone(&observed);
    let fold = move |_ctx: &mut FoldContext,
                     state: Option<String>,
                     record: &ConsumerRecord|
          -> Result<Option<String>, FoldError> {
        observer
            .lock()
            .expect("observer lock")
            .push(state.clone());
        let value = String::from_utf8(record.value.clone()).map_err(|err| FoldError::Decode {
            offset: record.offset,
            reason: err.to_string(),
        })?;
        Ok(Some(value))
    };
    let collaborators = FlowCollaborators {
        fold: Arc::new(fold),
        store: Arc::new(store),
        key_store: Arc::new(key_store),
        committer: queue,
    };
    let mut flow = PartitionFlow::assign(
        scope(),
        partition(),
        500,
        FlowConfig::low_latency(),
        collaborators,
        0,
    )
    .expect("assignment succeeds");

    flow.apply(&[ConsumerRecord::new(partition(), 501, "key1", "A2")], 1)
        .expect("batch applies");
    assert_eq!(
        observed.lock().expect("observer lock").as_slice(),
        &[Some("A".to_string())]
    );
}

#[test]
fn keys_of_other_scopes_are_ignored() {
    let (store, key_store) = seeded_stores();
    let foreign = FlowScope::new("other-app", "other-group").key_for(&partition(), "key9");
    store
        .persist(&foreign, &"X".to_string())
        .expect("seed foreign snapshot");
    key_store.add(foreign).expect("seed foreign key");

    let queue = Arc::new(CommitQueue::default());
    let collaborators = FlowCollaborators {
        fold: Arc::new(LastValueFold),
        store: Arc::new(store),
        key_store: Arc::new(key_store),
        committer: queue,
    };
    let flow = PartitionFlow::assign(
        scope(),
        partition(),
        500,
        FlowConfig::low_latency(),
        collaborators,
        0,
    )
    .expect("assignment succeeds");
    assert_eq!(flow.key_count(), 2);
}

#[test]
fn enumeration_failures_surface_as_recovery_errors() {
    let queue = Arc::new(CommitQueue::default());
    let collaborators: FlowCollaborators<String> = FlowCollaborators {
        fold: Arc::new(LastValueFold),
        store: Arc::new(MemorySnapshotStore::new()),
        key_store: Arc::new(BrokenKeyStore),
        committer: queue,
    };
    let err = PartitionFlow::assign(
        scope(),
        partition(),
        500,
        FlowConfig::low_latency(),
        collaborators,
        0,
    )
    .expect_err("recovery fails");
    assert!(matches!(err, RecoveryError::ListKeys { .. }));
}
