use keyflow::{
    CommitQueue, ConsumerRecord, FlowCollaborators, FlowConfig, FlowError, FlowScope, Fold,
    FoldContext, FoldError, MemoryKeyStore, MemorySnapshotStore, TopicFlow, TopicPartition,
};
use std::sync::{Arc, Mutex};

fn partition() -> TopicPartition {
    TopicPartition::new("input", 0)
}

fn scope() -> FlowScope {
    FlowScope::new("counter-app", "counter-group")
}

fn record(offset: u64, value: u64) -> ConsumerRecord {
    ConsumerRecord::new(partition(), offset, "key0", value.to_string())
}

type FoldCall = (String, Option<u64>, u64);

/// Parses the record value as an integer and keeps it as the state. A zero
/// input deletes the state. Every invocation is recorded as
/// `(key, state_before, input)` so tests can assert what the fold observed.
struct CountingFold {
    calls: Arc<Mutex<Vec<FoldCall>>>,
}

impl CountingFold {
    fn new() -> (Self, Arc<Mutex<Vec<FoldCall>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl Fold<u64> for CountingFold {
    fn apply(
        &self,
        _ctx: &mut FoldContext,
        state: Option<u64>,
        record: &ConsumerRecord,
    ) -> Result<Option<u64>, FoldError> {
        let key = String::from_utf8(record.key.clone().unwrap_or_default()).unwrap_or_default();
        let input: u64 = String::from_utf8(record.value.clone())
            .map_err(|err| FoldError::Decode {
                offset: record.offset,
                reason: err.to_string(),
            })?
            .parse()
            .map_err(|err: std::num::ParseIntError| FoldError::Decode {
                offset: record.offset,
                reason: err.to_string(),
            })?;
        self.calls
            .lock()
            .expect("calls lock")
            .push((key, state, input));
        if input == 0 {
            Ok(None)
        } else {
            Ok(Some(input))
        }
    }
}

struct Shared {
    store: MemorySnapshotStore<u64>,
    key_store: MemoryKeyStore,
    queue: Arc<CommitQueue>,
}

impl Shared {
    fn new() -> Self {
        Self {
            store: MemorySnapshotStore::new(),
            key_store: MemoryKeyStore::new(),
            queue: Arc::new(CommitQueue::default()),
        }
    }

    /// Builds a topic flow sharing the durable stores, modeling a program
    /// (re)start.
    fn topic_flow(&self, config: FlowConfig) -> (TopicFlow<u64>, Arc<Mutex<Vec<FoldCall>>>) {
        let (fold, calls) = CountingFold::new();
        let collaborators = FlowCollaborators {
            fold: Arc::new(fold),
            store: Arc::new(self.store.clone()),
            key_store: Arc::new(self.key_store.clone()),
            committer: self.queue.clone(),
        };
        (TopicFlow::new(scope(), config, collaborators), calls)
    }
}

fn calls_snapshot(calls: &Arc<Mutex<Vec<FoldCall>>>) -> Vec<FoldCall> {
    calls.lock().expect("calls lock").clone()
}

#[test]
fn state_survives_a_restart() {
    let shared = Shared::new();

    let (mut flow, calls) = shared.topic_flow(FlowConfig::low_latency());
    flow.assign(partition(), 0, 0).expect("assign");
    flow.apply(&partition(), &[record(0, 1), record(1, 2), record(2, 3)], 0)
        .expect("first run applies");
    assert_eq!(
        calls_snapshot(&calls),
        vec![
            ("key0".to_string(), None, 1),
            ("key0".to_string(), Some(1), 2),
            ("key0".to_string(), Some(2), 3),
        ]
    );

    let (mut flow, calls) = shared.topic_flow(FlowConfig::low_latency());
    flow.assign(partition(), 3, 0).expect("assign after restart");
    flow.apply(&partition(), &[record(3, 4), record(4, 5), record(5, 6)], 0)
        .expect("second run applies");
    assert_eq!(
        calls_snapshot(&calls),
        vec![
            ("key0".to_string(), Some(3), 4),
            ("key0".to_string(), Some(4), 5),
            ("key0".to_string(), Some(5), 6),
        ]
    );
}

#[test]
fn deletion_and_re_creation_round_trip() {
    let shared = Shared::new();

    let (mut flow, _calls) = shared.topic_flow(FlowConfig::low_latency());
    flow.assign(partition(), 0, 0).expect("assign");
    flow.apply(
        &partition(),
        &[
            record(0, 1),
            record(1, 2),
            record(2, 3),
            record(3, 4),
            record(4, 5),
            record(5, 6),
        ],
        0,
    )
    .expect("first run applies");

    let (mut flow, calls) = shared.topic_flow(FlowConfig::low_latency());
    flow.assign(partition(), 6, 0).expect("assign");
    flow.apply(&partition(), &[record(6, 0)], 0)
        .expect("deletion applies");
    assert_eq!(
        calls_snapshot(&calls),
        vec![("key0".to_string(), Some(6), 0)]
    );
    assert!(shared.store.is_empty());
    assert!(shared.key_store.is_empty());

    let (mut flow, calls) = shared.topic_flow(FlowConfig::low_latency());
    flow.assign(partition(), 7, 0).expect("assign");
    flow.apply(&partition(), &[record(7, 9)], 0)
        .expect("re-creation applies");
    assert_eq!(calls_snapshot(&calls), vec![("key0".to_string(), None, 9)]);
}

#[test]
fn flush_on_revoke_persists_dirty_keys() {
    let shared = Shared::new();
    let config = FlowConfig::low_latency()
        .with_persist_every_ms(600_000)
        .with_flush_on_revoke(true);

    let (mut flow, _calls) = shared.topic_flow(config.clone());
    flow.assign(partition(), 0, 0).expect("assign");
    flow.apply(&partition(), &[record(0, 41), record(1, 42)], 0)
        .expect("batch applies");
    assert!(shared.store.is_empty());

    assert!(flow.revoke(&partition(), 1));
    assert!(!flow.is_assigned(&partition()));
    let key0 = scope().key_for(&partition(), "key0");
    assert_eq!(shared.store.snapshot(&key0), Some(42));

    let (mut flow, calls) = shared.topic_flow(config);
    flow.assign(partition(), 2, 2).expect("assign after revoke");
    flow.apply(&partition(), &[record(2, 43)], 2)
        .expect("batch applies");
    assert_eq!(
        calls_snapshot(&calls),
        vec![("key0".to_string(), Some(42), 43)]
    );
}

#[test]
fn revoke_without_flush_leaves_the_store_untouched() {
    let shared = Shared::new();
    let config = FlowConfig::low_latency().with_persist_every_ms(600_000);

    let (mut flow, _calls) = shared.topic_flow(config);
    flow.assign(partition(), 0, 0).expect("assign");
    flow.apply(&partition(), &[record(0, 41)], 0)
        .expect("batch applies");
    assert!(flow.revoke(&partition(), 1));
    assert!(shared.store.is_empty());
}

#[test]
fn batches_for_unassigned_partitions_are_rejected() {
    let shared = Shared::new();
    let (mut flow, _calls) = shared.topic_flow(FlowConfig::low_latency());
    let err = flow
        .apply(&partition(), &[record(0, 1)], 0)
        .expect_err("unassigned partition");
    assert!(matches!(err, FlowError::NotAssigned { .. }));
    assert!(!flow.revoke(&partition(), 0));
}

#[test]
fn ticks_drive_persists_across_assigned_partitions() {
    let shared = Shared::new();
    let config = FlowConfig::new()
        .with_trigger_timers_interval_ms(0)
        .with_fire_every_ms(0)
        .with_persist_every_ms(60_000)
        .with_commit_offsets_interval_ms(0);

    let (mut flow, _calls) = shared.topic_flow(config);
    flow.assign(partition(), 0, 0).expect("assign");
    flow.apply(&partition(), &[record(0, 7)], 0)
        .expect("batch applies");
    assert!(shared.store.is_empty());

    flow.tick(61_000).expect("tick fires the persist");
    let key0 = scope().key_for(&partition(), "key0");
    assert_eq!(shared.store.snapshot(&key0), Some(7));
    assert_eq!(flow.assigned_partitions(), vec![partition()]);
}
