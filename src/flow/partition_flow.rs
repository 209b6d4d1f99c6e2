use crate::commit::ScheduleCommit;
use crate::config::FlowConfig;
use crate::flow::additional_persist::AdditionalPersist;
use crate::flow::key_state::KeyState;
use crate::flow::offset_tracker::{CommitEvaluation, OffsetTracker};
use crate::flow::recovery::{self, RecoveryError};
use crate::flow::timer::TimerFlow;
use crate::fold::{Fold, FoldError};
use crate::kafka::{ConsumerRecord, FlowScope, TopicPartition};
use crate::logging::{FlowLogger, LogLevel};
use crate::store::snapshot::{KeyStore, SnapshotStore, StoreError};
use crate::telemetry::FlowTelemetry;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Error that aborts a partition flow. The dispatcher logs the cause,
/// abandons the in-flight batch, and makes the partition eligible for
/// reassignment; committed offsets are never ahead of durable state.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("fold failed on partition {partition} at offset {offset}: {source}")]
    Fold {
        partition: TopicPartition,
        offset: u64,
        source: FoldError,
    },
    #[error("persist failed on partition {partition}: {source}")]
    Persist {
        partition: TopicPartition,
        source: StoreError,
    },
    #[error("key store update failed on partition {partition}: {source}")]
    KeyStore {
        partition: TopicPartition,
        source: StoreError,
    },
    #[error("partition {partition} is not assigned")]
    NotAssigned { partition: TopicPartition },
}

/// Shared collaborators handed to every partition flow at construction.
/// Passing them as parameters breaks the topic/partition/key construction
/// cycle without mutual references.
pub struct FlowCollaborators<S> {
    pub fold: Arc<dyn Fold<S>>,
    pub store: Arc<dyn SnapshotStore<S>>,
    pub key_store: Arc<dyn KeyStore>,
    pub committer: Arc<dyn ScheduleCommit>,
}

impl<S> Clone for FlowCollaborators<S> {
    fn clone(&self) -> Self {
        Self {
            fold: Arc::clone(&self.fold),
            store: Arc::clone(&self.store),
            key_store: Arc::clone(&self.key_store),
            committer: Arc::clone(&self.committer),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PersistCause {
    Regular,
    Additional,
    Revoke,
}

/// Per-partition flow engine.
///
/// Processes one batch at a time on a single logical thread: folds records
/// into per-key state, arbitrates snapshot persistence, and schedules the
/// offset that is safe to commit. Owned exclusively by its partition; the
/// only cross-partition sharing happens inside the snapshot store.
pub struct PartitionFlow<S> {
    scope: FlowScope,
    partition: TopicPartition,
    config: FlowConfig,
    fold: Arc<dyn Fold<S>>,
    store: Arc<dyn SnapshotStore<S>>,
    key_store: Arc<dyn KeyStore>,
    committer: Arc<dyn ScheduleCommit>,
    keys: HashMap<Vec<u8>, KeyState<S>>,
    tracker: OffsetTracker,
    timer: TimerFlow,
    cooldown: AdditionalPersist,
    logger: FlowLogger,
    telemetry: FlowTelemetry,
}

impl<S> std::fmt::Debug for PartitionFlow<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionFlow")
            .field("scope", &self.scope)
            .field("partition", &self.partition)
            .finish_non_exhaustive()
    }
}

impl<S> PartitionFlow<S> {
    /// Builds the flow for a newly assigned partition, running eager
    /// recovery before any record is accepted.
    pub fn assign(
        scope: FlowScope,
        partition: TopicPartition,
        assigned_at_offset: u64,
        config: FlowConfig,
        collaborators: FlowCollaborators<S>,
        now_ms: u64,
    ) -> Result<Self, RecoveryError> {
        let FlowCollaborators {
            fold,
            store,
            key_store,
            committer,
        } = collaborators;
        let recovered = recovery::recover_partition(
            &scope,
            &partition,
            assigned_at_offset,
            now_ms,
            key_store.as_ref(),
            store.as_ref(),
        )?;
        let mut telemetry = FlowTelemetry::new();
        telemetry.record_keys_recovered(recovered.len() as u64);
        let mut keys = HashMap::with_capacity(recovered.len());
        for entry in recovered {
            keys.insert(entry.key().key().to_vec(), entry);
        }
        let timer = TimerFlow::new(config.trigger_timers_interval_ms, config.fire_every_ms);
        let cooldown = AdditionalPersist::new(config.additional_persist_cooldown_ms);
        let mut flow = Self {
            scope,
            partition,
            config,
            fold,
            store,
            key_store,
            committer,
            keys,
            tracker: OffsetTracker::new(assigned_at_offset),
            timer,
            cooldown,
            logger: FlowLogger::default(),
            telemetry,
        };
        let recovered_count = flow.keys.len();
        flow.emit_log(
            now_ms,
            LogLevel::Info,
            Some(assigned_at_offset),
            &format!("assigned partition, recovered {recovered_count} keys"),
        );
        Ok(flow)
    }

    /// Partition this flow owns.
    pub fn partition(&self) -> &TopicPartition {
        &self.partition
    }

    /// Number of live keys.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Live state for a record key, if present.
    pub fn key_state(&self, key: &[u8]) -> Option<&KeyState<S>> {
        self.keys.get(key)
    }

    /// Commit-safety bookkeeping, read-only.
    pub fn tracker(&self) -> &OffsetTracker {
        &self.tracker
    }

    /// Counters maintained by this flow.
    pub fn telemetry(&self) -> &FlowTelemetry {
        &self.telemetry
    }

    /// Lines emitted by this flow's logger.
    pub fn logger(&self) -> &FlowLogger {
        &self.logger
    }

    /// Applies a dynamic log level override.
    pub fn set_log_level(&mut self, level: LogLevel) {
        self.logger.set_level(level);
    }

    /// Ingests one batch of records in offset order.
    ///
    /// Fold failures abort the whole batch: nothing from it is persisted and
    /// the error surfaces to the dispatcher. Persist failures follow the
    /// `ignore_persist_errors` policy.
    pub fn apply(&mut self, records: &[ConsumerRecord], now_ms: u64) -> Result<(), FlowError> {
        let mut order: Vec<Vec<u8>> = Vec::new();
        let mut groups: HashMap<Vec<u8>, Vec<&ConsumerRecord>> = HashMap::new();
        for record in records {
            match &record.key {
                Some(key) => {
                    let group = groups.entry(key.clone()).or_default();
                    if group.is_empty() {
                        order.push(key.clone());
                    }
                    group.push(record);
                }
                None => {
                    self.telemetry.record_keyless_skipped();
                    self.emit_log(
                        now_ms,
                        LogLevel::Debug,
                        Some(record.offset),
                        "skipping record without key",
                    );
                }
            }
        }
        for key_bytes in order {
            let group = groups.remove(&key_bytes).unwrap_or_default();
            self.apply_group(&key_bytes, &group, now_ms)?;
        }
        if let Some(last) = records.last() {
            self.tracker.record_processed(last.offset);
        }
        self.run_evaluations(now_ms)
    }

    /// Record-free evaluation point: drives timers, persists, key removal,
    /// and commit scheduling during input lulls.
    pub fn tick(&mut self, now_ms: u64) -> Result<(), FlowError> {
        self.run_evaluations(now_ms)
    }

    /// Releases the partition. When `flush_on_revoke` is set, every dirty
    /// key gets one final persist attempt; failures are logged and
    /// swallowed so the revoke always completes.
    pub fn revoke(mut self, now_ms: u64) {
        if self.config.flush_on_revoke {
            let mut dirty: Vec<Vec<u8>> = self
                .keys
                .iter()
                .filter(|(_, entry)| entry.is_dirty())
                .map(|(key, _)| key.clone())
                .collect();
            dirty.sort();
            for key_bytes in dirty {
                let _ = self.persist_key(&key_bytes, now_ms, PersistCause::Revoke);
            }
        }
        self.emit_log(now_ms, LogLevel::Info, None, "revoked partition");
    }

    fn apply_group(
        &mut self,
        key_bytes: &[u8],
        group: &[&ConsumerRecord],
        now_ms: u64,
    ) -> Result<(), FlowError> {
        let first_offset = match group.first() {
            Some(record) => record.offset,
            None => return Ok(()),
        };
        self.ensure_key(key_bytes, first_offset, now_ms)?;
        let fold = Arc::clone(&self.fold);
        let cooldown = self.cooldown;
        for record in group {
            let mut wants_additional = false;
            if let Some(entry) = self.keys.get_mut(key_bytes) {
                entry
                    .apply(fold.as_ref(), record)
                    .map_err(|source| FlowError::Fold {
                        partition: self.partition.clone(),
                        offset: record.offset,
                        source,
                    })?;
                wants_additional = entry.should_persist_additional(now_ms, &cooldown);
            }
            self.sync_hold(key_bytes);
            if wants_additional {
                self.persist_key(key_bytes, now_ms, PersistCause::Additional)?;
            }
        }
        Ok(())
    }

    fn ensure_key(
        &mut self,
        key_bytes: &[u8],
        first_offset: u64,
        now_ms: u64,
    ) -> Result<(), FlowError> {
        if self.keys.contains_key(key_bytes) {
            return Ok(());
        }
        let kafka_key = self.scope.key_for(&self.partition, key_bytes);
        self.key_store
            .add(kafka_key.clone())
            .map_err(|source| FlowError::KeyStore {
                partition: self.partition.clone(),
                source,
            })?;
        self.keys
            .insert(key_bytes.to_vec(), KeyState::new(kafka_key, first_offset, now_ms));
        Ok(())
    }

    fn run_evaluations(&mut self, now_ms: u64) -> Result<(), FlowError> {
        self.evaluate_timers(now_ms)?;
        self.remove_settled_keys(now_ms)?;
        self.evaluate_commit(now_ms);
        Ok(())
    }

    fn evaluate_timers(&mut self, now_ms: u64) -> Result<(), FlowError> {
        if !self.timer.should_fire(now_ms) {
            return Ok(());
        }
        self.timer.mark_fired(now_ms);
        let persist_every = self.config.persist_every_ms;
        let cooldown = self.cooldown;
        let mut due: Vec<(Vec<u8>, PersistCause)> = self
            .keys
            .iter()
            .filter_map(|(key, entry)| {
                if entry.should_persist_regular(now_ms, persist_every) {
                    Some((key.clone(), PersistCause::Regular))
                } else if entry.should_persist_additional(now_ms, &cooldown) {
                    Some((key.clone(), PersistCause::Additional))
                } else {
                    None
                }
            })
            .collect();
        due.sort_by(|a, b| a.0.cmp(&b.0));
        for (key_bytes, cause) in due {
            self.persist_key(&key_bytes, now_ms, cause)?;
        }
        Ok(())
    }

    fn persist_key(
        &mut self,
        key_bytes: &[u8],
        now_ms: u64,
        cause: PersistCause,
    ) -> Result<(), FlowError> {
        let store = Arc::clone(&self.store);
        let cooldown = self.cooldown;
        let result = match self.keys.get_mut(key_bytes) {
            Some(entry) => entry.persist(store.as_ref(), now_ms, &cooldown),
            None => return Ok(()),
        };
        match result {
            Ok(()) => {
                if cause == PersistCause::Additional {
                    self.telemetry.record_additional_persist();
                } else {
                    self.telemetry.record_persist();
                }
                self.sync_hold(key_bytes);
                Ok(())
            }
            Err(source) => {
                self.telemetry.record_persist_failure();
                let offset = self.keys.get(key_bytes).map(KeyState::last_seen_offset);
                self.emit_log(
                    now_ms,
                    LogLevel::Warn,
                    offset,
                    &format!("persist failed: {source}"),
                );
                if cause == PersistCause::Revoke || self.config.ignore_persist_errors {
                    Ok(())
                } else {
                    Err(FlowError::Persist {
                        partition: self.partition.clone(),
                        source,
                    })
                }
            }
        }
    }

    fn remove_settled_keys(&mut self, now_ms: u64) -> Result<(), FlowError> {
        let mut settled: Vec<Vec<u8>> = self
            .keys
            .iter()
            .filter(|(_, entry)| entry.is_settled_deletion())
            .map(|(key, _)| key.clone())
            .collect();
        settled.sort();
        for key_bytes in settled {
            if let Some(entry) = self.keys.remove(&key_bytes) {
                self.key_store
                    .remove(entry.key())
                    .map_err(|source| FlowError::KeyStore {
                        partition: self.partition.clone(),
                        source,
                    })?;
                self.tracker.release(&key_bytes);
                self.telemetry.record_key_removed();
                self.emit_log(
                    now_ms,
                    LogLevel::Debug,
                    Some(entry.last_seen_offset()),
                    "removed key after persisted deletion",
                );
            }
        }
        Ok(())
    }

    fn evaluate_commit(&mut self, now_ms: u64) {
        let evaluation = self
            .tracker
            .evaluate_commit(now_ms, self.config.commit_offsets_interval_ms);
        if let CommitEvaluation::Schedule(offset) = evaluation {
            match self.committer.schedule(&self.partition, offset) {
                Ok(()) => {
                    self.tracker.record_commit(offset, now_ms);
                    self.telemetry.record_commit_scheduled();
                    self.emit_log(now_ms, LogLevel::Debug, Some(offset), "scheduled commit");
                }
                Err(err) => {
                    self.telemetry.record_commit_rejection();
                    self.emit_log(
                        now_ms,
                        LogLevel::Warn,
                        Some(offset),
                        &format!("commit handoff rejected: {err}"),
                    );
                }
            }
        }
    }

    fn sync_hold(&mut self, key_bytes: &[u8]) {
        let hold = self.keys.get(key_bytes).and_then(KeyState::hold);
        self.tracker.update_hold(key_bytes, hold);
    }

    fn emit_log(&mut self, ts_ms: u64, level: LogLevel, offset: Option<u64>, message: &str) {
        // Losing a log line must never fail the flow.
        let _ = self
            .logger
            .log(ts_ms, level, &self.partition, offset, message);
    }
}
