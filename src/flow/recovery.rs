use crate::flow::key_state::KeyState;
use crate::kafka::{FlowScope, TopicPartition};
use crate::store::snapshot::{KeyStore, SnapshotStore, StoreError};
use thiserror::Error;

/// Failure to materialize prior state during assignment. Fatal to the
/// partition; the dispatcher owns retry and backoff.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("failed to enumerate keys for partition {partition}: {source}")]
    ListKeys {
        partition: TopicPartition,
        source: StoreError,
    },
    #[error("failed to load snapshot on partition {partition}: {source}")]
    LoadSnapshot {
        partition: TopicPartition,
        source: StoreError,
    },
}

/// Eager recovery: before the first record is processed after assignment,
/// load every known key's snapshot so the first in-flight record sees the
/// recovered state.
///
/// Recovered keys come back clean at the assignment offset and therefore do
/// not hold back the commit offset. Keys listed without a stored snapshot
/// are skipped.
pub fn recover_partition<S>(
    scope: &FlowScope,
    partition: &TopicPartition,
    assigned_at_offset: u64,
    now_ms: u64,
    key_store: &dyn KeyStore,
    store: &dyn SnapshotStore<S>,
) -> Result<Vec<KeyState<S>>, RecoveryError> {
    let keys = key_store
        .list(partition)
        .map_err(|source| RecoveryError::ListKeys {
            partition: partition.clone(),
            source,
        })?;
    let mut recovered = Vec::new();
    for key in keys {
        if key.application_id() != scope.application_id() || key.group_id() != scope.group_id() {
            continue;
        }
        let snapshot = store.get(&key).map_err(|source| RecoveryError::LoadSnapshot {
            partition: partition.clone(),
            source,
        })?;
        if let Some(state) = snapshot {
            recovered.push(KeyState::from_snapshot(
                key,
                state,
                assigned_at_offset,
                now_ms,
            ));
        }
    }
    Ok(recovered)
}
