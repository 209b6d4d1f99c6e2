/// Counter set maintained by a partition flow and exported to `/metrics`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlowTelemetry {
    persists: u64,
    additional_persists: u64,
    persist_failures: u64,
    commits_scheduled: u64,
    commit_rejections: u64,
    keys_recovered: u64,
    keys_removed: u64,
    keyless_records_skipped: u64,
}

impl FlowTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful regular persist.
    pub fn record_persist(&mut self) {
        self.persists = self.persists.saturating_add(1);
    }

    /// Records a successful additional (on-demand) persist.
    pub fn record_additional_persist(&mut self) {
        self.persists = self.persists.saturating_add(1);
        self.additional_persists = self.additional_persists.saturating_add(1);
    }

    /// Records a persist failure (ignored or fatal).
    pub fn record_persist_failure(&mut self) {
        self.persist_failures = self.persist_failures.saturating_add(1);
    }

    /// Records a commit handed off to the committer.
    pub fn record_commit_scheduled(&mut self) {
        self.commits_scheduled = self.commits_scheduled.saturating_add(1);
    }

    /// Records a commit handoff rejected by the committer.
    pub fn record_commit_rejection(&mut self) {
        self.commit_rejections = self.commit_rejections.saturating_add(1);
    }

    /// Records keys materialized by eager recovery.
    pub fn record_keys_recovered(&mut self, count: u64) {
        self.keys_recovered = self.keys_recovered.saturating_add(count);
    }

    /// Records a key removed after its deletion was persisted.
    pub fn record_key_removed(&mut self) {
        self.keys_removed = self.keys_removed.saturating_add(1);
    }

    /// Records a record skipped because it carried no key.
    pub fn record_keyless_skipped(&mut self) {
        self.keyless_records_skipped = self.keyless_records_skipped.saturating_add(1);
    }

    /// Number of successful persists, additional persists included.
    pub fn persists(&self) -> u64 {
        self.persists
    }

    /// Number of successful additional persists.
    pub fn additional_persists(&self) -> u64 {
        self.additional_persists
    }

    /// Number of failed persist attempts.
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures
    }

    /// Number of commits handed to the committer.
    pub fn commits_scheduled(&self) -> u64 {
        self.commits_scheduled
    }

    /// Number of rejected commit handoffs.
    pub fn commit_rejections(&self) -> u64 {
        self.commit_rejections
    }

    /// Number of keys materialized by eager recovery.
    pub fn keys_recovered(&self) -> u64 {
        self.keys_recovered
    }

    /// Number of keys removed after persisted deletion.
    pub fn keys_removed(&self) -> u64 {
        self.keys_removed
    }

    /// Metric samples emitted to `/metrics`.
    pub fn metrics(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("keyflow_persists_total", self.persists),
            ("keyflow_additional_persists_total", self.additional_persists),
            ("keyflow_persist_failures_total", self.persist_failures),
            ("keyflow_commits_scheduled_total", self.commits_scheduled),
            ("keyflow_commit_rejections_total", self.commit_rejections),
            ("keyflow_keys_recovered_total", self.keys_recovered),
            ("keyflow_keys_removed_total", self.keys_removed),
            (
                "keyflow_keyless_records_skipped_total",
                self.keyless_records_skipped,
            ),
        ]
    }
}
