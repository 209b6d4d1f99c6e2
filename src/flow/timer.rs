/// Pull-based timer for persist evaluation.
///
/// Rather than spawning a task per key, the partition flow polls this timer
/// at batch boundaries and on explicit ticks. Two gates apply: the trigger
/// interval bounds how often the flow checks timers at all, and the fire
/// interval bounds how often a check evaluates the keys. Zero disables a
/// gate, so an all-zero timer fires after every batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFlow {
    trigger_interval_ms: u64,
    fire_every_ms: u64,
    last_triggered_at_ms: Option<u64>,
    last_fired_at_ms: Option<u64>,
}

impl TimerFlow {
    /// Creates the timer with the provided gates.
    pub fn new(trigger_interval_ms: u64, fire_every_ms: u64) -> Self {
        Self {
            trigger_interval_ms,
            fire_every_ms,
            last_triggered_at_ms: None,
            last_fired_at_ms: None,
        }
    }

    /// True when both gates have elapsed and the keys should be evaluated.
    pub fn should_fire(&self, now_ms: u64) -> bool {
        let triggered = self.trigger_interval_ms == 0
            || self
                .last_triggered_at_ms
                .map_or(true, |at| now_ms.saturating_sub(at) >= self.trigger_interval_ms);
        let due = self.fire_every_ms == 0
            || self
                .last_fired_at_ms
                .map_or(true, |at| now_ms.saturating_sub(at) >= self.fire_every_ms);
        triggered && due
    }

    /// Records a completed evaluation.
    pub fn mark_fired(&mut self, now_ms: u64) {
        self.last_triggered_at_ms = Some(now_ms);
        self.last_fired_at_ms = Some(now_ms);
    }

    /// Instant of the last completed evaluation.
    pub fn last_fired_at_ms(&self) -> Option<u64> {
        self.last_fired_at_ms
    }
}
