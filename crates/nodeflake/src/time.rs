use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

/// Default epoch: Thursday, January 1, 2015 00:00:00 UTC, in milliseconds
/// since the Unix epoch.
pub const DEFAULT_EPOCH: u64 = 1_420_070_400_000;

/// A source of wall-clock time.
///
/// Implementations return **milliseconds since the Unix epoch**; the
/// generator subtracts its own epoch. Swapping in a mock lets tests freeze,
/// step or rewind time.
///
/// # Example
///
/// ```
/// use nodeflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

/// The system wall clock.
///
/// Unlike a monotonic timer this follows NTP steps and manual adjustments,
/// which is what lets the generator detect a clock that moved backwards.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        // A clock set before 1970 reads as 0 and is rejected as before-epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
            })
    }
}
