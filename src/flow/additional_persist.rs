/// Rate limit for on-demand persists. The cooldown is per key: every
/// successful persist arms the key's deadline, and only additional persists
/// consult it. Regular periodic persists ignore the cooldown entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdditionalPersist {
    cooldown_ms: u64,
}

impl AdditionalPersist {
    /// Creates the policy with the provided cooldown.
    pub fn new(cooldown_ms: u64) -> Self {
        Self { cooldown_ms }
    }

    /// Configured cooldown duration.
    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_ms
    }

    /// True when an additional persist may run given the key's deadline.
    pub fn allow(&self, now_ms: u64, deadline_ms: Option<u64>) -> bool {
        deadline_ms.map_or(true, |deadline| now_ms >= deadline)
    }

    /// Deadline to arm after a persist that completed at `now_ms`.
    pub fn next_deadline(&self, now_ms: u64) -> u64 {
        now_ms.saturating_add(self.cooldown_ms)
    }
}
