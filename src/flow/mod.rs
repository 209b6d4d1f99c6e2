//! The per-partition flow engine: per-key folded state, persist arbitration,
//! offset-hold bookkeeping, eager recovery, and the partition lifecycle map.
//!
//! Submodules are kept small so each concern can evolve independently.

pub mod additional_persist;
pub mod key_state;
pub mod offset_tracker;
pub mod partition_flow;
pub mod recovery;
pub mod timer;
pub mod topic_flow;

pub use additional_persist::AdditionalPersist;
pub use key_state::KeyState;
pub use offset_tracker::{CommitEvaluation, CommitSkipReason, OffsetTracker};
pub use partition_flow::{FlowCollaborators, FlowError, PartitionFlow};
pub use recovery::{recover_partition, RecoveryError};
pub use timer::TimerFlow;
pub use topic_flow::TopicFlow;
