use core::{fmt, str::FromStr};

use crate::{
    DATACENTER_ID_SHIFT, EPOCH_MILLIS, Error, IdInfo, InvalidIdReason, MAX_DATACENTER_ID, MAX_SEQUENCE,
    MAX_TIMESTAMP, MAX_WORKER_ID, Result, SnowflakeParser, SnowflakeValidator, TIMESTAMP_SHIFT,
    WORKER_ID_SHIFT,
};

/// A 64-bit Snowflake ID.
///
/// - 1 bit reserved (always zero for valid IDs)
/// - 41 bits timestamp (ms since [`EPOCH`])
/// - 5 bits datacenter ID
/// - 5 bits worker ID
/// - 12 bits sequence
///
/// The wrapper is a plain signed integer on the wire. Accessors such as
/// [`Self::worker_id`] do not validate; use [`Self::info`] for a checked
/// decode.
///
/// # Example
///
/// ```
/// use snowgen::SnowflakeId;
///
/// let id = SnowflakeId::from_components(1000, 3, 7, 1);
/// assert_eq!(id.datacenter_id(), 3);
/// assert_eq!(id.worker_id(), 7);
/// assert_eq!(id.sequence(), 1);
/// ```
///
/// [`EPOCH`]: crate::EPOCH
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SnowflakeId {
    id: i64,
}

impl SnowflakeId {
    /// Wraps a raw integer without validating it.
    pub const fn from_raw(raw: i64) -> Self {
        Self { id: raw }
    }

    /// Returns the raw integer.
    pub const fn to_raw(self) -> i64 {
        self.id
    }

    /// Packs the components into an ID. Each component is masked to its field
    /// width.
    pub const fn from_components(
        timestamp: i64,
        datacenter_id: i64,
        worker_id: i64,
        sequence: i64,
    ) -> Self {
        let timestamp = (timestamp & MAX_TIMESTAMP) << TIMESTAMP_SHIFT;
        let datacenter_id = (datacenter_id & MAX_DATACENTER_ID) << DATACENTER_ID_SHIFT;
        let worker_id = (worker_id & MAX_WORKER_ID) << WORKER_ID_SHIFT;
        let sequence = sequence & MAX_SEQUENCE;
        Self {
            id: timestamp | datacenter_id | worker_id | sequence,
        }
    }

    /// Extracts the timestamp offset since the epoch, or `0` if the raw value
    /// is not positive.
    pub const fn timestamp(&self) -> i64 {
        if self.id <= 0 {
            return 0;
        }
        (self.id >> TIMESTAMP_SHIFT) & MAX_TIMESTAMP
    }

    /// Extracts the absolute timestamp in Unix milliseconds, or `0` if the raw
    /// value is not positive.
    pub const fn timestamp_ms(&self) -> i64 {
        if self.id <= 0 {
            return 0;
        }
        self.timestamp() + EPOCH_MILLIS
    }

    /// Extracts the datacenter ID, or `-1` if the raw value is not positive.
    pub const fn datacenter_id(&self) -> i64 {
        if self.id <= 0 {
            return -1;
        }
        (self.id >> DATACENTER_ID_SHIFT) & MAX_DATACENTER_ID
    }

    /// Extracts the worker ID, or `-1` if the raw value is not positive.
    pub const fn worker_id(&self) -> i64 {
        if self.id <= 0 {
            return -1;
        }
        (self.id >> WORKER_ID_SHIFT) & MAX_WORKER_ID
    }

    /// Extracts the sequence, or `-1` if the raw value is not positive.
    pub const fn sequence(&self) -> i64 {
        if self.id <= 0 {
            return -1;
        }
        self.id & MAX_SEQUENCE
    }

    /// Returns `true` if the ID passes the built-in Snowflake validator.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validates the ID against the wall clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSnowflakeId`] if the ID is not positive or its
    /// timestamp lies before the epoch or too far in the future.
    pub fn validate(&self) -> Result<()> {
        SnowflakeValidator::new().validate(*self)
    }

    /// Validates and decodes the ID into its components.
    ///
    /// # Errors
    ///
    /// See [`Self::validate`].
    pub fn info(&self) -> Result<IdInfo> {
        SnowflakeParser::new().parse(*self)
    }

    /// Encodes the ID as 16 lowercase hexadecimal digits.
    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.id)
    }

    /// Decodes an ID from hexadecimal digits, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for malformed input and
    /// [`Error::InvalidSnowflakeId`] if the decoded value fails validation.
    pub fn from_hex(s: &str) -> Result<Self> {
        Self::checked(Self::decode_hex(s)?)
    }

    pub(crate) fn decode_hex(s: &str) -> Result<i64> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() || digits.len() > 16 {
            return Err(Error::decode(format_args!(
                "expected 1 to 16 hex digits, got {}",
                digits.len()
            )));
        }
        let raw = u64::from_str_radix(digits, 16).map_err(Error::decode)?;
        Ok(raw as i64)
    }

    /// Encodes the ID as 8 big-endian bytes.
    pub const fn to_be_bytes(&self) -> [u8; 8] {
        self.id.to_be_bytes()
    }

    /// Decodes an ID from 8 big-endian bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSnowflakeId`] if the decoded value fails
    /// validation.
    pub fn from_be_bytes(bytes: [u8; 8]) -> Result<Self> {
        Self::checked(i64::from_be_bytes(bytes))
    }

    pub(crate) fn checked(raw: i64) -> Result<Self> {
        let id = Self::from_raw(raw);
        id.validate()?;
        Ok(id)
    }

    /// Only rejects non-positive values. Wire decoding uses this so any ID
    /// the crate serializes reads back, whatever its timestamp.
    #[cfg(feature = "serde")]
    pub(crate) fn positive(raw: i64) -> Result<Self> {
        if raw <= 0 {
            return Err(Error::InvalidSnowflakeId {
                id: raw,
                reason: InvalidIdReason::NonPositive,
            });
        }
        Ok(Self::from_raw(raw))
    }
}

impl From<SnowflakeId> for i64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl TryFrom<i64> for SnowflakeId {
    type Error = Error;

    fn try_from(raw: i64) -> Result<Self> {
        Self::checked(raw)
    }
}

impl TryFrom<&[u8]> for SnowflakeId {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 8] = bytes
            .try_into()
            .map_err(|_| Error::decode(format_args!("expected 8 bytes, got {}", bytes.len())))?;
        Self::from_be_bytes(bytes)
    }
}

impl FromStr for SnowflakeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim().parse::<i64>().map_err(Error::decode)?;
        Self::checked(raw)
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::LowerHex for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.id, f)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp())
            .field("datacenter_id", &self.datacenter_id())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}
