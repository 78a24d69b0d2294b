use crate::{
    EPOCH_MILLIS, Error, GeneratorType, InvalidIdReason, MAX_FUTURE_SKEW_MILLIS, Result,
    SnowflakeId, SystemClock, TIMESTAMP_SHIFT, TimeSource,
};

/// Structural validation of IDs for one generator type.
pub trait Validator: Send + Sync {
    fn generator_type(&self) -> GeneratorType;

    /// Checks a single ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSnowflakeId`] describing the first failed check.
    fn validate(&self, id: SnowflakeId) -> Result<()>;

    /// Checks every ID in order, stopping at the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBatchElement`] wrapping the failing index and
    /// its validation error.
    fn validate_batch(&self, ids: &[SnowflakeId]) -> Result<()> {
        for (index, id) in ids.iter().enumerate() {
            self.validate(*id)
                .map_err(|source| Error::InvalidBatchElement {
                    index,
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }
}

/// Validates Snowflake IDs against the fixed bit layout and a clock.
///
/// An ID is valid when it is positive, its timestamp is not before the epoch,
/// and its timestamp is at most [`MAX_FUTURE_SKEW_MILLIS`] ahead of the clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnowflakeValidator<T = SystemClock> {
    time: T,
}

impl SnowflakeValidator {
    /// A validator reading the system wall clock.
    pub const fn new() -> Self {
        Self { time: SystemClock }
    }
}

impl<T: TimeSource> SnowflakeValidator<T> {
    pub fn with_time(time: T) -> Self {
        Self { time }
    }

    /// # Errors
    ///
    /// See [`Validator::validate`].
    pub fn validate(&self, id: SnowflakeId) -> Result<()> {
        let raw = id.to_raw();
        let invalid = |reason| Err(Error::InvalidSnowflakeId { id: raw, reason });

        if raw <= 0 {
            return invalid(InvalidIdReason::NonPositive);
        }
        let timestamp = (raw >> TIMESTAMP_SHIFT) + EPOCH_MILLIS;
        if timestamp < EPOCH_MILLIS {
            return invalid(InvalidIdReason::BeforeEpoch);
        }
        if timestamp > self.time.current_millis().saturating_add(MAX_FUTURE_SKEW_MILLIS) {
            return invalid(InvalidIdReason::TooFarInFuture);
        }
        Ok(())
    }
}

impl<T> Validator for SnowflakeValidator<T>
where
    T: TimeSource + Send + Sync,
{
    fn generator_type(&self) -> GeneratorType {
        GeneratorType::Snowflake
    }

    fn validate(&self, id: SnowflakeId) -> Result<()> {
        self.validate(id)
    }
}
