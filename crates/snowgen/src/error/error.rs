use core::fmt;

use thiserror::Error;

use crate::registry::GeneratorType;

/// A result type defaulting to the crate-wide [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Why an identifier failed structural validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvalidIdReason {
    /// The raw value is zero or negative.
    NonPositive,
    /// The decoded timestamp precedes [`crate::EPOCH`].
    BeforeEpoch,
    /// The decoded timestamp is beyond the allowed future skew.
    TooFarInFuture,
}

impl fmt::Display for InvalidIdReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NonPositive => "id must be positive",
            Self::BeforeEpoch => "timestamp precedes the epoch",
            Self::TooFarInFuture => "timestamp is too far in the future",
        })
    }
}

/// All error variants that `snowgen` can emit.
///
/// Every variant is a plain value: nothing in this crate panics or aborts on
/// failure, and variants compare with `==` so callers can branch on the kind.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The generator configuration is missing a required value or out of
    /// bounds.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// The worker ID does not fit in 5 bits.
    #[error("invalid worker id {id}: must be in [0, {max}]", max = crate::MAX_WORKER_ID)]
    InvalidWorkerId { id: u64 },

    /// The datacenter ID does not fit in 5 bits.
    #[error("invalid datacenter id {id}: must be in [0, {max}]", max = crate::MAX_DATACENTER_ID)]
    InvalidDatacenterId { id: u64 },

    /// The wall clock is behind the last issued timestamp and the configured
    /// strategy could not absorb the drift.
    #[error("clock moved backwards by {drift_ms}ms")]
    ClockMovedBackwards { drift_ms: i64 },

    /// The wall clock reads a time that cannot be encoded in 41 bits relative
    /// to the epoch.
    #[error("clock reading {timestamp_ms}ms is outside the encodable range")]
    ClockOutOfRange { timestamp_ms: i64 },

    /// A batch request asked for zero IDs or more than
    /// [`crate::MAX_BATCH_SIZE`].
    #[error("invalid batch size {size}: must be in [1, {max}]", max = crate::MAX_BATCH_SIZE)]
    InvalidBatchSize { size: usize },

    /// The identifier is not structurally valid.
    #[error("invalid snowflake id {id}: {reason}")]
    InvalidSnowflakeId { id: i64, reason: InvalidIdReason },

    /// An element of a batch failed validation.
    #[error("invalid id at index {index}: {source}")]
    InvalidBatchElement { index: usize, source: Box<Error> },

    /// A generator type name could not be resolved.
    #[error("invalid generator type: {name:?}")]
    InvalidGeneratorType { name: String },

    #[error("no factory registered for generator type {0}")]
    FactoryNotFound(GeneratorType),

    #[error("no parser registered for generator type {0}")]
    ParserNotFound(GeneratorType),

    #[error("no validator registered for generator type {0}")]
    ValidatorNotFound(GeneratorType),

    #[error("generator {key:?} already exists")]
    GeneratorAlreadyExists { key: String },

    #[error("generator {key:?} not found")]
    GeneratorNotFound { key: String },

    /// The instance registry is at capacity.
    #[error("maximum number of generators ({max}) reached")]
    MaxGeneratorsReached { max: usize },

    /// The registry key is empty.
    #[error("generator key must not be empty")]
    InvalidKey,

    /// The registry key is too long or contains characters outside
    /// `[a-zA-Z0-9_\-.]`.
    #[error("invalid generator key format: {key:?}")]
    InvalidKeyFormat { key: String },

    /// A textual or binary ID representation could not be decoded.
    #[error("failed to decode id: {reason}")]
    Decode { reason: String },
}

impl Error {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(reason: impl fmt::Display) -> Self {
        Self::Decode {
            reason: reason.to_string(),
        }
    }

    /// Returns `true` if the error came from the clock running behind the
    /// generator's last timestamp.
    pub fn is_clock_backward(&self) -> bool {
        matches!(self, Self::ClockMovedBackwards { .. })
    }
}
