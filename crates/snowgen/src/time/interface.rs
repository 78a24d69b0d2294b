use core::time::Duration;

/// Snowgen epoch: Monday, January 1, 2024 00:00:00 UTC, in Unix milliseconds.
///
/// Every ID stores its timestamp as an offset from this instant. Changing it
/// breaks ordering between IDs minted before and after the change.
pub const EPOCH_MILLIS: i64 = 1_704_067_200_000;

/// [`EPOCH_MILLIS`] as a [`Duration`] since the Unix epoch.
pub const EPOCH: Duration = Duration::from_millis(EPOCH_MILLIS as u64);

/// A trait for time sources that return a wall-clock timestamp.
///
/// This abstraction allows you to plug in the real system clock or a mocked
/// time source in tests. Unlike a monotonic timer, a wall clock may step
/// backwards (e.g. after an NTP correction); generators detect and handle that
/// case themselves.
///
/// # Example
///
/// ```
/// use snowgen::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> i64 {
///         1_704_067_200_123
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1_704_067_200_123);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> i64;

    /// Blocks the calling thread for `dur`.
    ///
    /// Generators call this while waiting for the clock to advance, so a mock
    /// source can move its own time forward instead of sleeping.
    fn sleep(&self, dur: Duration) {
        std::thread::sleep(dur);
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn current_millis(&self) -> i64 {
        (**self).current_millis()
    }

    fn sleep(&self, dur: Duration) {
        (**self).sleep(dur);
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> i64 {
        (**self).current_millis()
    }

    fn sleep(&self, dur: Duration) {
        (**self).sleep(dur);
    }
}
