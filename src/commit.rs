use crate::kafka::TopicPartition;
use crossbeam_queue::ArrayQueue;
use thiserror::Error;

/// Default capacity of the commit handoff queue.
pub const COMMIT_QUEUE_CAPACITY: usize = 1_024;

/// Commit handed off to the consumer thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub partition: TopicPartition,
    pub offset: u64,
}

/// Error raised when a commit cannot be handed off.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommitError {
    #[error("commit queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },
}

/// Non-blocking handoff of commit offsets to the consumer thread, which
/// performs the actual commit against the log.
pub trait ScheduleCommit: Send + Sync {
    fn schedule(&self, partition: &TopicPartition, offset: u64) -> Result<(), CommitError>;
}

/// Bounded lock-free commit queue shared between partition flows and the
/// consumer thread.
pub struct CommitQueue {
    queue: ArrayQueue<CommitRequest>,
}

impl CommitQueue {
    /// Creates a queue with the provided capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
        }
    }

    /// Number of queued requests.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when no requests are queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drains all queued requests in handoff order. Called from the consumer
    /// thread before issuing commits.
    pub fn drain(&self) -> Vec<CommitRequest> {
        let mut requests = Vec::new();
        while let Some(request) = self.queue.pop() {
            requests.push(request);
        }
        requests
    }
}

impl Default for CommitQueue {
    fn default() -> Self {
        Self::new(COMMIT_QUEUE_CAPACITY)
    }
}

impl ScheduleCommit for CommitQueue {
    fn schedule(&self, partition: &TopicPartition, offset: u64) -> Result<(), CommitError> {
        self.queue
            .push(CommitRequest {
                partition: partition.clone(),
                offset,
            })
            .map_err(|_| CommitError::QueueFull {
                capacity: self.queue.capacity(),
            })
    }
}
