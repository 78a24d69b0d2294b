use thiserror::Error;

use crate::{error::Error, id::SnowflakeId};

/// A batch request that stopped before producing every requested ID.
///
/// The IDs generated before the failure are valid and unique; they are handed
/// back in [`BatchError::generated`] rather than dropped.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("batch generation stopped after {} ids: {source}", .generated.len())]
pub struct BatchError {
    /// IDs successfully produced before the failure, in generation order.
    pub generated: Vec<SnowflakeId>,
    /// The error that interrupted the batch.
    pub source: Error,
}

impl BatchError {
    pub(crate) fn new(generated: Vec<SnowflakeId>, source: Error) -> Self {
        Self { generated, source }
    }

    /// Splits the error into the partial result and its cause.
    pub fn into_parts(self) -> (Vec<SnowflakeId>, Error) {
        (self.generated, self.source)
    }
}

impl From<BatchError> for Error {
    fn from(err: BatchError) -> Self {
        err.source
    }
}
