/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `nodeflake` can emit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A configuration value was rejected, e.g. an explicit node ID outside
    /// `0..=1023` or a value that is not an integer.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Human-readable description of the rejected value.
        reason: String,
    },

    /// The clock reported a time earlier than the last issued timestamp.
    ///
    /// The generator state is left untouched, so a later call succeeds once
    /// the clock has caught up again.
    #[error("clock moved backwards: now {now} ms is before last issued {last} ms")]
    ClockRegression {
        /// Observed milliseconds since the generator epoch.
        now: u64,
        /// Last issued milliseconds since the generator epoch.
        last: u64,
    },

    /// The clock reported a time earlier than the generator epoch.
    #[error("clock reading {now} ms is before the epoch {epoch} ms")]
    ClockBeforeEpoch {
        /// Observed milliseconds since the Unix epoch.
        now: u64,
        /// Generator epoch in milliseconds since the Unix epoch.
        epoch: u64,
    },

    /// The timestamp relative to the epoch no longer fits in 41 bits.
    #[error("timestamp {timestamp} ms does not fit in the 41-bit timestamp field")]
    TimestampOverflow {
        /// Milliseconds since the generator epoch.
        timestamp: u64,
    },

    /// The generator lock was **poisoned** by a thread panicking while
    /// holding it. With the `parking-lot` feature mutexes do not poison and
    /// this variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,
}

impl Error {
    pub(crate) fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
