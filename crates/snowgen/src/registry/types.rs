use core::{fmt, str::FromStr};

use crate::{Error, Result};

/// Discriminant selecting a generator/parser/validator implementation family.
///
/// Only [`GeneratorType::Snowflake`] ships with an implementation; the other
/// variants are slots for implementations registered by the application.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum GeneratorType {
    #[default]
    Snowflake,
    Uuid,
    Custom,
}

impl GeneratorType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Snowflake => "snowflake",
            Self::Uuid => "uuid",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for GeneratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeneratorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "snowflake" => Ok(Self::Snowflake),
            "uuid" => Ok(Self::Uuid),
            "custom" => Ok(Self::Custom),
            _ => Err(Error::InvalidGeneratorType { name: s.to_owned() }),
        }
    }
}
