use crate::flow::additional_persist::AdditionalPersist;
use crate::fold::{Fold, FoldContext, FoldError};
use crate::kafka::{ConsumerRecord, KafkaKey};
use crate::store::snapshot::{SnapshotStore, StoreError};

/// Live per-key state owned exclusively by one partition flow.
///
/// Tracks the folded value together with the bookkeeping that decides when
/// the key is persisted and which offset it holds back from being committed.
#[derive(Debug)]
pub struct KeyState<S> {
    key: KafkaKey,
    state: Option<S>,
    last_seen_offset: u64,
    persisted_offset: Option<u64>,
    hold_offset: Option<u64>,
    last_persist_at_ms: u64,
    cooldown_deadline_ms: Option<u64>,
    additional_persist_requested: bool,
}

impl<S> KeyState<S> {
    /// Creates the state for a key first observed at `first_seen_offset`.
    /// The hold is installed by the first `apply`, not at creation.
    pub fn new(key: KafkaKey, first_seen_offset: u64, now_ms: u64) -> Self {
        Self {
            key,
            state: None,
            last_seen_offset: first_seen_offset,
            persisted_offset: None,
            hold_offset: None,
            last_persist_at_ms: now_ms,
            cooldown_deadline_ms: None,
            additional_persist_requested: false,
        }
    }

    /// Materializes a key from a recovered snapshot. The key is clean: its
    /// durable offset equals the assignment offset, so it imposes no hold.
    pub fn from_snapshot(key: KafkaKey, state: S, assigned_at_offset: u64, now_ms: u64) -> Self {
        Self {
            key,
            state: Some(state),
            last_seen_offset: assigned_at_offset,
            persisted_offset: Some(assigned_at_offset),
            hold_offset: None,
            last_persist_at_ms: now_ms,
            cooldown_deadline_ms: None,
            additional_persist_requested: false,
        }
    }

    /// Full identity of this key.
    pub fn key(&self) -> &KafkaKey {
        &self.key
    }

    /// Latest folded value, absent when the key is deleted or empty.
    pub fn state(&self) -> Option<&S> {
        self.state.as_ref()
    }

    /// Highest offset processed for this key.
    pub fn last_seen_offset(&self) -> u64 {
        self.last_seen_offset
    }

    /// Highest offset whose effect has been durably snapshotted.
    pub fn persisted_offset(&self) -> Option<u64> {
        self.persisted_offset
    }

    /// True while the key carries folded work that is not yet durable.
    ///
    /// Dirtiness follows the hold, not an offset comparison: a record that
    /// lands exactly on a recovered key's assignment offset still dirties
    /// the key, so its new state (or tombstone) is persisted before the key
    /// can settle or stop holding the partition.
    pub fn is_dirty(&self) -> bool {
        self.hold_offset.is_some()
    }

    /// Offset this key holds the partition at, `None` when clean.
    ///
    /// The hold is the offset of the first record folded since the last
    /// successful persist: the oldest offset whose effect is not yet
    /// durable.
    pub fn hold(&self) -> Option<u64> {
        self.hold_offset
    }

    /// True when the fold flagged this key for an on-demand persist that has
    /// not run yet.
    pub fn additional_persist_requested(&self) -> bool {
        self.additional_persist_requested
    }

    /// Runs the fold for one record. On success the record is considered
    /// processed; on failure the hold offset does not advance and the error
    /// propagates to the caller, which abandons the batch.
    pub fn apply(&mut self, fold: &dyn Fold<S>, record: &ConsumerRecord) -> Result<(), FoldError> {
        let mut ctx = FoldContext::new();
        let next = fold.apply(&mut ctx, self.state.take(), record)?;
        self.state = next;
        self.last_seen_offset = record.offset;
        if self.hold_offset.is_none() {
            self.hold_offset = Some(record.offset);
        }
        if ctx.additional_persist_requested() {
            self.additional_persist_requested = true;
        }
        Ok(())
    }

    /// True when the regular persist cadence is due for this key.
    pub fn should_persist_regular(&self, now_ms: u64, persist_every_ms: u64) -> bool {
        self.is_dirty() && now_ms.saturating_sub(self.last_persist_at_ms) >= persist_every_ms
    }

    /// True when a requested additional persist may run under the cooldown.
    pub fn should_persist_additional(&self, now_ms: u64, policy: &AdditionalPersist) -> bool {
        self.additional_persist_requested && policy.allow(now_ms, self.cooldown_deadline_ms)
    }

    /// Writes the current value to the store (a deletion when the value is
    /// absent). On success the durable offset catches up to the last seen
    /// offset, the hold is released, and the cooldown is re-armed; on
    /// failure no bookkeeping moves, so the hold stays in place and the
    /// request flag survives for a retry.
    pub fn persist(
        &mut self,
        store: &dyn SnapshotStore<S>,
        now_ms: u64,
        policy: &AdditionalPersist,
    ) -> Result<(), StoreError> {
        match &self.state {
            Some(state) => store.persist(&self.key, state)?,
            None => store.delete(&self.key)?,
        }
        self.persisted_offset = Some(self.last_seen_offset);
        self.hold_offset = None;
        self.last_persist_at_ms = now_ms;
        self.cooldown_deadline_ms = Some(policy.next_deadline(now_ms));
        self.additional_persist_requested = false;
        Ok(())
    }

    /// True when the key was deleted and the deletion is durable, meaning
    /// the entry can be dropped from the partition map.
    pub fn is_settled_deletion(&self) -> bool {
        self.state.is_none() && !self.is_dirty() && self.persisted_offset.is_some()
    }
}
