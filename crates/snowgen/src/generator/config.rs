use core::{fmt, str::FromStr};

use crate::{Error, MAX_DATACENTER_ID, MAX_WORKER_ID, Result};

/// Tolerance applied to [`ClockBackwardStrategy::Wait`] when none is
/// configured.
pub const DEFAULT_CLOCK_BACKWARD_TOLERANCE_MS: u64 = 5;

/// Upper bound on the configurable clock-backward tolerance.
pub const MAX_CLOCK_BACKWARD_TOLERANCE_MS: u64 = 1000;

/// How a generator reacts when the wall clock reads earlier than the last
/// timestamp it issued.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClockBackwardStrategy {
    /// Fail immediately with [`Error::ClockMovedBackwards`]. Retrying is left
    /// to the caller.
    #[default]
    Error,
    /// If the drift is within tolerance, sleep `drift + 1` ms and re-check, up
    /// to 10 times, before failing.
    Wait,
    /// Keep issuing IDs under the last timestamp. Never fails, but IDs may no
    /// longer reflect wall-clock order while the clock is behind.
    UseLastTimestamp,
}

impl ClockBackwardStrategy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Wait => "wait",
            Self::UseLastTimestamp => "use_last_timestamp",
        }
    }
}

impl fmt::Display for ClockBackwardStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClockBackwardStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "wait" => Ok(Self::Wait),
            "use_last_timestamp" | "uselasttimestamp" => Ok(Self::UseLastTimestamp),
            other => Err(Error::invalid_config(format!(
                "unknown clock backward strategy {other:?}"
            ))),
        }
    }
}

/// Parameters for a [`crate::SnowflakeGenerator`].
///
/// A config is validated and copied into the generator at construction;
/// later changes to the caller's value have no effect on the generator.
///
/// # Example
///
/// ```
/// use snowgen::{ClockBackwardStrategy, GeneratorConfig};
///
/// let config = GeneratorConfig::new(1, 2)
///     .with_clock_backward_strategy(ClockBackwardStrategy::Wait)
///     .with_clock_backward_tolerance_ms(20);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.clock_backward_tolerance(), 20);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GeneratorConfig {
    /// Datacenter ID in `[0, 31]`.
    pub datacenter_id: u8,
    /// Worker ID in `[0, 31]`.
    pub worker_id: u8,
    pub clock_backward_strategy: ClockBackwardStrategy,
    /// Maximum drift absorbed by [`ClockBackwardStrategy::Wait`], in
    /// milliseconds. `None` means [`DEFAULT_CLOCK_BACKWARD_TOLERANCE_MS`].
    pub clock_backward_tolerance_ms: Option<u64>,
    pub enable_metrics: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            datacenter_id: 0,
            worker_id: 0,
            clock_backward_strategy: ClockBackwardStrategy::default(),
            clock_backward_tolerance_ms: None,
            enable_metrics: true,
        }
    }
}

impl GeneratorConfig {
    /// Creates a config for the given `(datacenter, worker)` pair with every
    /// other option at its default.
    pub fn new(datacenter_id: u8, worker_id: u8) -> Self {
        Self {
            datacenter_id,
            worker_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_clock_backward_strategy(mut self, strategy: ClockBackwardStrategy) -> Self {
        self.clock_backward_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_clock_backward_tolerance_ms(mut self, tolerance_ms: u64) -> Self {
        self.clock_backward_tolerance_ms = Some(tolerance_ms);
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.enable_metrics = enabled;
        self
    }

    /// The effective clock-backward tolerance in milliseconds.
    pub fn clock_backward_tolerance(&self) -> u64 {
        self.clock_backward_tolerance_ms
            .unwrap_or(DEFAULT_CLOCK_BACKWARD_TOLERANCE_MS)
    }

    /// Checks every field against its bounds.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDatacenterId`] if `datacenter_id > 31`
    /// - [`Error::InvalidWorkerId`] if `worker_id > 31`
    /// - [`Error::InvalidConfig`] if the tolerance exceeds
    ///   [`MAX_CLOCK_BACKWARD_TOLERANCE_MS`]
    pub fn validate(&self) -> Result<()> {
        if i64::from(self.datacenter_id) > MAX_DATACENTER_ID {
            return Err(Error::InvalidDatacenterId {
                id: u64::from(self.datacenter_id),
            });
        }
        if i64::from(self.worker_id) > MAX_WORKER_ID {
            return Err(Error::InvalidWorkerId {
                id: u64::from(self.worker_id),
            });
        }
        let tolerance = self.clock_backward_tolerance();
        if tolerance > MAX_CLOCK_BACKWARD_TOLERANCE_MS {
            return Err(Error::invalid_config(format!(
                "clock backward tolerance {tolerance}ms exceeds {MAX_CLOCK_BACKWARD_TOLERANCE_MS}ms"
            )));
        }
        Ok(())
    }

    /// Validates the config and fills in defaults, producing the value a
    /// generator stores.
    pub(crate) fn normalized(&self) -> Result<Self> {
        self.validate()?;
        Ok(Self {
            clock_backward_tolerance_ms: Some(self.clock_backward_tolerance()),
            ..self.clone()
        })
    }
}
