use crate::SnowflakeId;

/// The outcome of a non-blocking generation attempt.
///
/// Returned by [`SnowflakeGenerator::poll_id`]. The generator state only
/// changes when an ID is handed out, so a caller may drop a `Pending` result
/// at any time without leaving the generator half-updated.
///
/// # Example
///
/// ```
/// use nodeflake::{NodeId, Poll, SnowflakeGenerator, SystemClock};
///
/// let generator = SnowflakeGenerator::with_clock(NodeId::new(1)?, 0, SystemClock);
/// let id = loop {
///     match generator.poll_id()? {
///         Poll::Ready { id } => break id,
///         Poll::Pending { .. } => std::thread::yield_now(),
///     }
/// };
/// assert_eq!(id.node_id(), 1);
/// # Ok::<(), nodeflake::Error>(())
/// ```
///
/// [`SnowflakeGenerator::poll_id`]: crate::SnowflakeGenerator::poll_id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: SnowflakeId,
    },
    /// The sequence for the current millisecond is exhausted. Retry after
    /// `yield_for` milliseconds.
    Pending {
        /// Milliseconds to wait before the clock can be expected to advance.
        yield_for: u64,
    },
}

impl Poll {
    /// Returns the ID if one was generated.
    pub const fn ready(self) -> Option<SnowflakeId> {
        match self {
            Self::Ready { id } => Some(id),
            Self::Pending { .. } => None,
        }
    }
}
