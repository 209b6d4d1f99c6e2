use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Error surfaced while converting state to or from its byte representation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("failed to encode state: {reason}")]
    Encode { reason: String },
    #[error("failed to decode state: {reason}")]
    Decode { reason: String },
}

/// Byte codec for user state. The engine never inspects state values; it only
/// moves their encoded form in and out of snapshot stores.
pub trait StateCodec<S>: Send + Sync {
    fn encode(&self, state: &S) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<S, CodecError>;
}

/// JSON codec for any serde-enabled state type.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStateCodec;

impl JsonStateCodec {
    pub fn new() -> Self {
        Self
    }
}

impl<S> StateCodec<S> for JsonStateCodec
where
    S: Serialize + DeserializeOwned,
{
    fn encode(&self, state: &S) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(state).map_err(|err| CodecError::Encode {
            reason: err.to_string(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<S, CodecError> {
        serde_json::from_slice(bytes).map_err(|err| CodecError::Decode {
            reason: err.to_string(),
        })
    }
}
