use std::collections::BTreeMap;

/// Decision produced by a commit evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitEvaluation {
    /// Hand `offset` to the committer.
    Schedule(u64),
    Skip(CommitSkipReason),
}

/// Reason why a commit evaluation scheduled nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitSkipReason {
    /// The safe offset has not advanced past the last committed offset.
    NoProgress,
    /// The minimum interval since the previous commit has not elapsed.
    IntervalNotElapsed,
}

/// Partition-wide commit-safety bookkeeping.
///
/// Maintains the map of key holds (the lowest offset whose effect on a key
/// is not yet durable) and derives the offset that is safe to commit: the
/// minimum hold across dirty keys, or the processed ceiling when every key
/// is durable. Committed offsets therefore never run ahead of durable state.
#[derive(Debug, Clone)]
pub struct OffsetTracker {
    assigned_at_offset: u64,
    last_processed_offset: Option<u64>,
    last_committed_offset: Option<u64>,
    last_commit_at_ms: Option<u64>,
    holds: BTreeMap<Vec<u8>, u64>,
}

impl OffsetTracker {
    /// Creates the tracker for a partition assigned at `assigned_at_offset`.
    pub fn new(assigned_at_offset: u64) -> Self {
        Self {
            assigned_at_offset,
            last_processed_offset: None,
            last_committed_offset: None,
            last_commit_at_ms: None,
            holds: BTreeMap::new(),
        }
    }

    /// Offset at which the partition was assigned.
    pub fn assigned_at_offset(&self) -> u64 {
        self.assigned_at_offset
    }

    /// Highest offset handed to the flow so far.
    pub fn last_processed_offset(&self) -> Option<u64> {
        self.last_processed_offset
    }

    /// Last offset handed to the committer.
    pub fn last_committed_offset(&self) -> Option<u64> {
        self.last_committed_offset
    }

    /// Number of keys currently holding the partition.
    pub fn held_keys(&self) -> usize {
        self.holds.len()
    }

    /// Advances the processed ceiling.
    pub fn record_processed(&mut self, offset: u64) {
        self.last_processed_offset = Some(
            self.last_processed_offset
                .map_or(offset, |last| last.max(offset)),
        );
    }

    /// Mirrors a key's hold: `Some` installs or moves it, `None` releases it.
    pub fn update_hold(&mut self, key: &[u8], hold: Option<u64>) {
        match hold {
            Some(offset) => {
                self.holds.insert(key.to_vec(), offset);
            }
            None => {
                self.holds.remove(key);
            }
        }
    }

    /// Releases a key's hold, if any.
    pub fn release(&mut self, key: &[u8]) {
        self.holds.remove(key);
    }

    /// The offset below which every key effect is durable.
    pub fn safe_offset(&self) -> u64 {
        if let Some(min_hold) = self.holds.values().copied().min() {
            return min_hold;
        }
        match self.last_processed_offset {
            Some(processed) => processed.saturating_add(1).max(self.assigned_at_offset),
            None => self.assigned_at_offset,
        }
    }

    /// Decides whether a commit should be scheduled at `now_ms`.
    ///
    /// The very first commit after assignment bypasses the interval gate and
    /// fires as soon as any record has been processed; afterwards commits are
    /// spaced by at least `interval_ms` and only scheduled on progress.
    pub fn evaluate_commit(&self, now_ms: u64, interval_ms: u64) -> CommitEvaluation {
        let safe = self.safe_offset();
        match self.last_committed_offset {
            Some(committed) => {
                if safe <= committed {
                    return CommitEvaluation::Skip(CommitSkipReason::NoProgress);
                }
                let elapsed = self
                    .last_commit_at_ms
                    .map_or(interval_ms, |at| now_ms.saturating_sub(at));
                if elapsed < interval_ms {
                    return CommitEvaluation::Skip(CommitSkipReason::IntervalNotElapsed);
                }
                CommitEvaluation::Schedule(safe)
            }
            None => {
                if self.last_processed_offset.is_none() {
                    return CommitEvaluation::Skip(CommitSkipReason::NoProgress);
                }
                CommitEvaluation::Schedule(safe)
            }
        }
    }

    /// Records a commit accepted by the committer.
    pub fn record_commit(&mut self, offset: u64, now_ms: u64) {
        self.last_committed_offset = Some(offset);
        self.last_commit_at_ms = Some(now_ms);
    }
}
