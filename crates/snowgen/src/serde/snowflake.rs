use core::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};

use crate::{Error, SnowflakeId};

/// Serializes as a decimal string so that consumers parsing numbers as IEEE
/// doubles (JavaScript, most JSON tooling) do not lose precision.
impl Serialize for SnowflakeId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(self)
    }
}

/// Accepts a decimal string or an integer.
///
/// Only non-positive values are rejected, so every serialized ID reads back
/// even when its timestamp is far from the local clock. Call
/// [`SnowflakeId::validate`] afterwards to apply the full checks.
impl<'de> Deserialize<'de> for SnowflakeId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_any(SnowflakeVisitor)
    }
}

struct SnowflakeVisitor;

impl Visitor<'_> for SnowflakeVisitor {
    type Value = SnowflakeId;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a snowflake ID as a decimal string or integer")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let raw = v.trim().parse::<i64>().map_err(|e| de::Error::custom(Error::decode(e)))?;
        self.visit_i64(raw)
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        SnowflakeId::positive(v).map_err(de::Error::custom)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let raw = i64::try_from(v)
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Unsigned(v), &self))?;
        self.visit_i64(raw)
    }
}

/// Serialize a [`SnowflakeId`] as a JSON-style integer instead of a string.
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use snowgen::SnowflakeId;
///
/// #[derive(Serialize, Deserialize)]
/// struct Row {
///     #[serde(with = "snowgen::as_number")]
///     id: SnowflakeId,
/// }
/// ```
pub mod as_number {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::SnowflakeId;

    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        id.to_raw().serialize(s)
    }

    /// # Errors
    ///
    /// Returns an error if the input is not a positive `i64`.
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = i64::deserialize(d)?;
        SnowflakeId::positive(raw).map_err(serde::de::Error::custom)
    }
}

/// Serialize a [`SnowflakeId`] as 16 lowercase hex digits.
pub mod as_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::SnowflakeId;

    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&id.to_hex())
    }

    /// # Errors
    ///
    /// Returns an error if the input is not a hex string or decodes to a
    /// non-positive value.
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        SnowflakeId::decode_hex(&s)
            .and_then(SnowflakeId::positive)
            .map_err(serde::de::Error::custom)
    }
}
