use core::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::SnowflakeId;

/// The decoded components of a validated [`SnowflakeId`].
///
/// Returned by [`crate::Parser::parse`]; each call builds a fresh value.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IdInfo {
    /// The ID that was decoded.
    pub id: SnowflakeId,
    /// Absolute timestamp in Unix milliseconds.
    pub timestamp_ms: i64,
    pub datacenter_id: u8,
    pub worker_id: u8,
    pub sequence: u16,
}

impl IdInfo {
    /// The timestamp as a [`SystemTime`].
    pub fn time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.timestamp_ms.max(0) as u64)
    }
}

impl fmt::Display for IdInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (ts={}ms dc={} worker={} seq={})",
            self.id, self.timestamp_ms, self.datacenter_id, self.worker_id, self.sequence
        )
    }
}
