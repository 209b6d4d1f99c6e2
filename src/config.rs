use serde::{Deserialize, Serialize};

/// Default minimum interval between scheduled commits (1 minute).
pub const DEFAULT_COMMIT_OFFSETS_INTERVAL_MS: u64 = 60_000;
/// Default cadence for polling timers at batch boundaries (1 second).
pub const DEFAULT_TRIGGER_TIMERS_INTERVAL_MS: u64 = 1_000;
/// Default timer fire interval (1 second).
pub const DEFAULT_FIRE_EVERY_MS: u64 = 1_000;
/// Default minimum interval between regular persists of a key (1 minute).
pub const DEFAULT_PERSIST_EVERY_MS: u64 = 60_000;
/// Default per-key cooldown between additional persists (5 seconds).
pub const DEFAULT_ADDITIONAL_PERSIST_COOLDOWN_MS: u64 = 5_000;

/// Tuning knobs for a partition flow. A zero interval means "evaluate at
/// every batch boundary".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub commit_offsets_interval_ms: u64,
    pub trigger_timers_interval_ms: u64,
    pub fire_every_ms: u64,
    pub persist_every_ms: u64,
    pub additional_persist_cooldown_ms: u64,
    pub flush_on_revoke: bool,
    pub ignore_persist_errors: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            commit_offsets_interval_ms: DEFAULT_COMMIT_OFFSETS_INTERVAL_MS,
            trigger_timers_interval_ms: DEFAULT_TRIGGER_TIMERS_INTERVAL_MS,
            fire_every_ms: DEFAULT_FIRE_EVERY_MS,
            persist_every_ms: DEFAULT_PERSIST_EVERY_MS,
            additional_persist_cooldown_ms: DEFAULT_ADDITIONAL_PERSIST_COOLDOWN_MS,
            flush_on_revoke: false,
            ignore_persist_errors: false,
        }
    }
}

impl FlowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset with every interval at zero: persist and commit evaluation run
    /// after every batch. Used by tests and low-latency deployments.
    pub fn low_latency() -> Self {
        Self {
            commit_offsets_interval_ms: 0,
            trigger_timers_interval_ms: 0,
            fire_every_ms: 0,
            persist_every_ms: 0,
            additional_persist_cooldown_ms: 0,
            flush_on_revoke: false,
            ignore_persist_errors: false,
        }
    }

    /// Sets the minimum interval between scheduled commits.
    pub fn with_commit_offsets_interval_ms(mut self, interval_ms: u64) -> Self {
        self.commit_offsets_interval_ms = interval_ms;
        self
    }

    /// Sets how often timers are polled at batch boundaries.
    pub fn with_trigger_timers_interval_ms(mut self, interval_ms: u64) -> Self {
        self.trigger_timers_interval_ms = interval_ms;
        self
    }

    /// Sets the timer fire interval.
    pub fn with_fire_every_ms(mut self, interval_ms: u64) -> Self {
        self.fire_every_ms = interval_ms;
        self
    }

    /// Sets the minimum interval between regular persists of a key.
    pub fn with_persist_every_ms(mut self, interval_ms: u64) -> Self {
        self.persist_every_ms = interval_ms;
        self
    }

    /// Sets the per-key cooldown between additional persists.
    pub fn with_additional_persist_cooldown_ms(mut self, cooldown_ms: u64) -> Self {
        self.additional_persist_cooldown_ms = cooldown_ms;
        self
    }

    /// Enables or disables the final persist of dirty keys on revoke.
    pub fn with_flush_on_revoke(mut self, enabled: bool) -> Self {
        self.flush_on_revoke = enabled;
        self
    }

    /// When enabled, persist failures are logged and the flow continues with
    /// the key's durable offset unchanged.
    pub fn with_ignore_persist_errors(mut self, enabled: bool) -> Self {
        self.ignore_persist_errors = enabled;
        self
    }
}
