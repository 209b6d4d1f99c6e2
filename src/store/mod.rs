//! Snapshot persistence seams and the bundled store implementations.
//!
//! The core engine only speaks the `SnapshotStore` and `KeyStore` contracts;
//! concrete backends live behind them. The crate ships an in-memory pair and
//! a compacted-changelog-backed store.

pub mod changelog;
pub mod memory;
pub mod snapshot;

pub use changelog::{
    ChangelogProducer, ChangelogReader, ChangelogRecord, ChangelogSnapshotStore, MemoryChangelog,
    CHANGELOG_CONSUMER_AUTO_COMMIT, CHANGELOG_CONSUMER_AUTO_OFFSET_RESET, CHANGELOG_PRODUCER_ACKS,
    CHANGELOG_PRODUCER_IDEMPOTENCE,
};
pub use memory::{MemoryKeyStore, MemorySnapshotStore};
pub use snapshot::{KeyStore, SnapshotStore, StoreError};
