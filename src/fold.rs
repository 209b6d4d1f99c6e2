use crate::kafka::ConsumerRecord;
use thiserror::Error;

/// Error raised by user fold code. Always fatal to the batch that carried the
/// offending record; the partition flow surfaces it to the dispatcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FoldError {
    #[error("failed to decode record value at offset {offset}: {reason}")]
    Decode { offset: u64, reason: String },
    #[error("record at offset {offset} rejected: {reason}")]
    Rejected { offset: u64, reason: String },
}

/// Side channel handed to the fold on every invocation.
///
/// Requesting an additional persist tells the engine the key has reached a
/// committable state, so the partition offset can advance ahead of the
/// regular persist cadence.
#[derive(Debug, Default)]
pub struct FoldContext {
    additional_persist_requested: bool,
}

impl FoldContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the engine to persist this key as soon as the cooldown allows.
    pub fn request_additional_persist(&mut self) {
        self.additional_persist_requested = true;
    }

    /// True when the fold asked for an additional persist.
    pub fn additional_persist_requested(&self) -> bool {
        self.additional_persist_requested
    }
}

/// Reducer from `(state, record)` to the next state.
///
/// `None` in means the key has no prior state; `None` out requests deletion.
/// The fold may perform effects but must be deterministic for the same
/// `(state, record)` pair, otherwise replay after a restart diverges.
pub trait Fold<S>: Send + Sync {
    fn apply(
        &self,
        ctx: &mut FoldContext,
        state: Option<S>,
        record: &ConsumerRecord,
    ) -> Result<Option<S>, FoldError>;
}

impl<S, F> Fold<S> for F
where
    F: Fn(&mut FoldContext, Option<S>, &ConsumerRecord) -> Result<Option<S>, FoldError>
        + Send
        + Sync,
{
    fn apply(
        &self,
        ctx: &mut FoldContext,
        state: Option<S>,
        record: &ConsumerRecord,
    ) -> Result<Option<S>, FoldError> {
        self(ctx, state, record)
    }
}
