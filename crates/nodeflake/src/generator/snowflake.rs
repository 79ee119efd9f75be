use core::{cmp::Ordering, fmt};

#[cfg(feature = "tracing")]
use tracing::{instrument, warn};

use crate::{
    EPOCH_BITS, Error, GeneratorBuilder, MAX_TIMESTAMP, NODE_ID_BITS, NodeId, ParsedId, Poll,
    Result, SEQUENCE_BITS, SnowflakeId, SystemClock, TimeSource,
    generator::{Mutex, MutexGuard},
};

/// Number of `spin_loop` hints between thread yields while waiting for the
/// clock to leave an exhausted millisecond.
const SPINS_PER_YIELD: u32 = 64;

/// Result of applying a clock reading to the generator state.
enum Step {
    /// The next ID to issue.
    Ready(SnowflakeId),
    /// The millisecond of the carried (last issued) ID has no sequence
    /// numbers left.
    Exhausted(SnowflakeId),
}

/// A lock-based Snowflake ID generator, safe to share across threads.
///
/// One generator owns the node's `(last timestamp, sequence)` state behind a
/// mutex. Every call reads the clock, compares it with the last issued
/// timestamp and updates the state inside a single critical section, so
/// concurrent callers observe a strict serial order.
///
/// Construct one per node and pass it around by reference or [`Arc`]. Two
/// generators with the same node ID can mint duplicate IDs.
///
/// ## Blocking
///
/// [`Self::next_id`] busy-waits while holding the lock when 4096 IDs were
/// already issued in the current millisecond. The wait ends as soon as the
/// clock advances, or with [`Error::ClockRegression`] if it steps back. With
/// a clock that never moves it never ends.
/// [`Self::poll_id`] is the non-blocking alternative.
///
/// # Example
///
/// ```
/// use nodeflake::SnowflakeGenerator;
///
/// let generator = SnowflakeGenerator::new(Some(42), None)?;
/// let a = generator.next_id()?;
/// let b = generator.next_id()?;
/// assert!(a < b);
/// assert_eq!(b.node_id(), 42);
/// # Ok::<(), nodeflake::Error>(())
/// ```
///
/// [`Arc`]: std::sync::Arc
#[derive(Debug)]
pub struct SnowflakeGenerator<T = SystemClock>
where
    T: TimeSource,
{
    /// Last issued ID, `None` until the first one.
    state: Mutex<Option<SnowflakeId>>,
    node_id: NodeId,
    epoch: u64,
    time: T,
}

impl SnowflakeGenerator<SystemClock> {
    /// Creates a generator on the system clock.
    ///
    /// - `node_id`: `Some` to assign the node explicitly, `None` to derive it
    ///   from the host's hardware addresses (random if there are none).
    /// - `epoch`: milliseconds since the Unix epoch, defaults to
    ///   [`DEFAULT_EPOCH`] (2015-01-01T00:00:00Z).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if an explicit `node_id` is
    /// outside `0..=1023`.
    ///
    /// [`DEFAULT_EPOCH`]: crate::DEFAULT_EPOCH
    pub fn new(node_id: Option<i64>, epoch: Option<u64>) -> Result<Self> {
        let mut builder = Self::builder().node_source(node_id.into());
        if let Some(epoch) = epoch {
            builder = builder.epoch(epoch);
        }
        builder.build()
    }

    /// Starts a [`GeneratorBuilder`] with the defaults: network-derived node
    /// ID, [`DEFAULT_EPOCH`] and the system clock.
    ///
    /// [`DEFAULT_EPOCH`]: crate::DEFAULT_EPOCH
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::new()
    }
}

impl<T> SnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator from an already resolved node ID, an epoch and a
    /// time source.
    pub fn with_clock(node_id: NodeId, epoch: u64, time: T) -> Self {
        Self {
            state: Mutex::new(None),
            node_id,
            epoch,
            time,
        }
    }

    pub const fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// The epoch in milliseconds since the Unix epoch.
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Generates the next ID, blocking if the current millisecond is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock is behind the last issued
    ///   timestamp, including while waiting out an exhausted millisecond. The
    ///   state is unchanged and a later call succeeds once the clock catches
    ///   up.
    /// - [`Error::ClockBeforeEpoch`] or [`Error::TimestampOverflow`] if the
    ///   clock reading does not fit the timestamp field.
    /// - [`Error::LockPoisoned`] if another thread panicked inside the
    ///   critical section (std mutex only).
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        let mut last = self.lock()?;
        let now = self.elapsed_millis()?;

        let id = match self.advance(*last, now)? {
            Step::Ready(id) => id,
            Step::Exhausted(prev) => {
                let next = self.wait_next_millis(prev.timestamp())?;
                prev.rollover_to_timestamp(next)
            }
        };

        *last = Some(id);
        Ok(id)
    }

    /// Attempts to generate the next ID without blocking.
    ///
    /// Returns [`Poll::Pending`] when the sequence for the current millisecond
    /// is exhausted; nothing is mutated in that case.
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_id`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> Result<Poll> {
        let mut last = self.lock()?;
        let now = self.elapsed_millis()?;

        match self.advance(*last, now)? {
            Step::Ready(id) => {
                *last = Some(id);
                Ok(Poll::Ready { id })
            }
            Step::Exhausted(_) => Ok(Poll::Pending { yield_for: 1 }),
        }
    }

    /// Generates the next ID, sleeping on the tokio timer instead of spinning
    /// when the current millisecond is exhausted.
    ///
    /// Dropping the future at the await point is safe: state is only
    /// mutated when an ID is returned.
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_id`].
    #[cfg_attr(docsrs, doc(cfg(feature = "async-tokio")))]
    #[cfg(feature = "async-tokio")]
    pub async fn next_id_async(&self) -> Result<SnowflakeId> {
        loop {
            match self.poll_id()? {
                Poll::Ready { id } => return Ok(id),
                Poll::Pending { yield_for } => {
                    tokio::time::sleep(core::time::Duration::from_millis(yield_for)).await;
                }
            }
        }
    }

    /// Decodes `id` using this generator's epoch.
    pub const fn parse(&self, id: u64) -> ParsedId {
        crate::decode(id, self.epoch)
    }

    /// Human-readable summary of the layout and configuration.
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Applies one clock reading to the last issued ID.
    fn advance(&self, last: Option<SnowflakeId>, now: u64) -> Result<Step> {
        let Some(prev) = last else {
            return Ok(Step::Ready(SnowflakeId::from_components(
                now,
                self.node_id.get(),
                0,
            )));
        };

        match now.cmp(&prev.timestamp()) {
            Ordering::Greater => Ok(Step::Ready(prev.rollover_to_timestamp(now))),
            Ordering::Equal if prev.has_sequence_room() => {
                Ok(Step::Ready(prev.increment_sequence()))
            }
            Ordering::Equal => Ok(Step::Exhausted(prev)),
            Ordering::Less => Err(Self::cold_clock_behind(now, prev.timestamp())),
        }
    }

    /// Re-samples the clock until it passes `last`. Fails if the clock falls
    /// behind `last` while waiting.
    fn wait_next_millis(&self, last: u64) -> Result<u64> {
        let mut spins = 0u32;
        loop {
            let now = self.elapsed_millis()?;
            match now.cmp(&last) {
                Ordering::Greater => return Ok(now),
                Ordering::Less => return Err(Self::cold_clock_behind(now, last)),
                Ordering::Equal => {}
            }

            spins = spins.wrapping_add(1);
            if spins % SPINS_PER_YIELD == 0 {
                std::thread::yield_now();
            } else {
                core::hint::spin_loop();
            }
        }
    }

    /// Current clock reading in milliseconds since the generator epoch.
    fn elapsed_millis(&self) -> Result<u64> {
        let now = self.time.current_millis();
        let timestamp = now.checked_sub(self.epoch).ok_or(Error::ClockBeforeEpoch {
            now,
            epoch: self.epoch,
        })?;
        if timestamp > MAX_TIMESTAMP {
            return Err(Error::TimestampOverflow { timestamp });
        }
        Ok(timestamp)
    }

    #[cfg(feature = "parking-lot")]
    fn lock(&self) -> Result<MutexGuard<'_, Option<SnowflakeId>>> {
        Ok(self.state.lock())
    }

    #[cfg(not(feature = "parking-lot"))]
    fn lock(&self) -> Result<MutexGuard<'_, Option<SnowflakeId>>> {
        Ok(self.state.lock()?)
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last: u64) -> Error {
        #[cfg(feature = "tracing")]
        warn!(now, last, "clock moved backwards, refusing to generate id");
        Error::ClockRegression { now, last }
    }
}

impl<T> fmt::Display for SnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Snowflake Settings [EPOCH_BITS={EPOCH_BITS}, NODE_ID_BITS={NODE_ID_BITS}, \
             SEQUENCE_BITS={SEQUENCE_BITS}, CUSTOM_EPOCH={}, NodeId={}]",
            self.epoch, self.node_id
        )
    }
}
