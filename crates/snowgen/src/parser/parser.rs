use crate::{
    GeneratorType, IdInfo, Result, SnowflakeId, SnowflakeValidator, SystemClock, TimeSource,
};

/// Decodes IDs of one generator type into their components.
pub trait Parser: Send + Sync {
    fn generator_type(&self) -> GeneratorType;

    /// Validates `id` and decodes it.
    ///
    /// # Errors
    ///
    /// Returns the validator's error for structurally invalid IDs; nothing is
    /// decoded in that case.
    fn parse(&self, id: SnowflakeId) -> Result<IdInfo>;

    /// Absolute timestamp in Unix milliseconds, `0` for non-positive IDs.
    /// Does not validate.
    fn extract_timestamp(&self, id: SnowflakeId) -> i64;

    /// Datacenter ID, `-1` for non-positive IDs. Does not validate.
    fn extract_datacenter_id(&self, id: SnowflakeId) -> i64;

    /// Worker ID, `-1` for non-positive IDs. Does not validate.
    fn extract_worker_id(&self, id: SnowflakeId) -> i64;

    /// Sequence, `-1` for non-positive IDs. Does not validate.
    fn extract_sequence(&self, id: SnowflakeId) -> i64;
}

/// Parser for the built-in Snowflake layout.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnowflakeParser<T = SystemClock> {
    validator: SnowflakeValidator<T>,
}

impl SnowflakeParser {
    /// A parser validating against the system wall clock.
    pub const fn new() -> Self {
        Self {
            validator: SnowflakeValidator::new(),
        }
    }
}

impl<T: TimeSource> SnowflakeParser<T> {
    pub fn with_time(time: T) -> Self {
        Self {
            validator: SnowflakeValidator::with_time(time),
        }
    }

    /// # Errors
    ///
    /// See [`Parser::parse`].
    pub fn parse(&self, id: SnowflakeId) -> Result<IdInfo> {
        self.validator.validate(id)?;
        // Validation guarantees a positive id, so every field is in range.
        Ok(IdInfo {
            id,
            timestamp_ms: id.timestamp_ms(),
            datacenter_id: id.datacenter_id() as u8,
            worker_id: id.worker_id() as u8,
            sequence: id.sequence() as u16,
        })
    }
}

impl<T> Parser for SnowflakeParser<T>
where
    T: TimeSource + Send + Sync,
{
    fn generator_type(&self) -> GeneratorType {
        GeneratorType::Snowflake
    }

    fn parse(&self, id: SnowflakeId) -> Result<IdInfo> {
        self.parse(id)
    }

    fn extract_timestamp(&self, id: SnowflakeId) -> i64 {
        id.timestamp_ms()
    }

    fn extract_datacenter_id(&self, id: SnowflakeId) -> i64 {
        id.datacenter_id()
    }

    fn extract_worker_id(&self, id: SnowflakeId) -> i64 {
        id.worker_id()
    }

    fn extract_sequence(&self, id: SnowflakeId) -> i64 {
        id.sequence()
    }
}
