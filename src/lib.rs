//! keyflow: a per-partition flow engine for stateful stream processing over
//! partitioned, replayable logs.
//!
//! For every record consumed from an input partition the engine folds a
//! per-key state, arbitrates when that state is flushed to a snapshot store,
//! and tracks which offset is safe to commit given the unpersisted work each
//! key is holding. On assignment, eager recovery materializes all prior
//! state before normal consumption begins, so processing resumes
//! deterministically. Semantics are at-least-once with deterministic state
//! recovery.
//!
//! The engine is synchronous and single-logical-thread per partition; every
//! entry point takes an explicit `now_ms` instant, which makes timer and
//! cooldown behavior fully deterministic under test. Kafka clients, the
//! rebalance dispatcher, and concrete remote stores stay outside the crate
//! behind the `SnapshotStore`, `KeyStore`, `ChangelogProducer`, and
//! `ScheduleCommit` seams.

pub mod clock;
pub mod codec;
pub mod commit;
pub mod config;
pub mod flow;
pub mod fold;
pub mod kafka;
pub mod logging;
pub mod store;
pub mod telemetry;

pub use clock::{MonotonicClock, SystemMonotonicClock};
pub use codec::{CodecError, JsonStateCodec, StateCodec};
pub use commit::{
    CommitError, CommitQueue, CommitRequest, ScheduleCommit, COMMIT_QUEUE_CAPACITY,
};
pub use config::{
    FlowConfig, DEFAULT_ADDITIONAL_PERSIST_COOLDOWN_MS, DEFAULT_COMMIT_OFFSETS_INTERVAL_MS,
    DEFAULT_FIRE_EVERY_MS, DEFAULT_PERSIST_EVERY_MS, DEFAULT_TRIGGER_TIMERS_INTERVAL_MS,
};
pub use flow::{
    recover_partition, AdditionalPersist, CommitEvaluation, CommitSkipReason, FlowCollaborators,
    FlowError, KeyState, OffsetTracker, PartitionFlow, RecoveryError, TimerFlow, TopicFlow,
};
pub use fold::{Fold, FoldContext, FoldError};
pub use kafka::{ConsumerRecord, FlowScope, KafkaKey, RecordHeader, TopicPartition};
pub use logging::{FlowLogger, LogLevel, LoggingError, DEFAULT_LOG_RETENTION};
pub use store::{
    ChangelogProducer, ChangelogReader, ChangelogRecord, ChangelogSnapshotStore, KeyStore,
    MemoryChangelog, MemoryKeyStore, MemorySnapshotStore, SnapshotStore, StoreError,
    CHANGELOG_CONSUMER_AUTO_COMMIT, CHANGELOG_CONSUMER_AUTO_OFFSET_RESET, CHANGELOG_PRODUCER_ACKS,
    CHANGELOG_PRODUCER_IDEMPOTENCE,
};
pub use telemetry::FlowTelemetry;
