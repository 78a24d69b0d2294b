use std::time::{SystemTime, UNIX_EPOCH};

use crate::TimeSource;

/// The operating system wall clock.
///
/// Each call performs a `SystemTime::now()` syscall. A system clock set before
/// 1970 reads as a negative offset, which generators reject as out of range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
            Err(before) => i64::try_from(before.duration().as_millis()).map_or(i64::MIN, |ms| -ms),
        }
    }
}
